use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    CharacterSkin,
    WeaponSkin,
    Emote,
    Taunt,
    Badge,
    Title,
    ParticleEffect,
    Other,
}

text_enum!(Slot {
    CharacterSkin => "character_skin",
    WeaponSkin => "weapon_skin",
    Emote => "emote",
    Taunt => "taunt",
    Badge => "badge",
    Title => "title",
    ParticleEffect => "particle_effect",
    Other => "other",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

text_enum!(Rarity {
    Common => "common",
    Uncommon => "uncommon",
    Rare => "rare",
    Epic => "epic",
    Legendary => "legendary",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlockMethod {
    LevelUp,
    Purchase,
    LootDrop,
    Prestige,
}

text_enum!(UnlockMethod {
    LevelUp => "level_up",
    Purchase => "purchase",
    LootDrop => "loot_drop",
    Prestige => "prestige",
});

/// Catalog record. For prestige-only items `unlock_level` is the prestige
/// tier that unlocks them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CosmeticItem {
    pub id: i64,
    pub name: String,
    pub slot: Slot,
    pub rarity: Rarity,
    pub unlock_level: i64,
    pub currency_cost: i64,
    pub prestige_only: bool,
}

#[derive(Debug, Serialize)]
pub struct OwnedCosmetic {
    #[serde(flatten)]
    pub item: CosmeticItem,
    pub unlocked_at: String,
    pub unlock_method: UnlockMethod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantOutcome {
    Granted,
    AlreadyOwned,
}

#[derive(Debug, Deserialize)]
pub struct CosmeticRequest {
    pub cosmetic_id: i64,
}

#[derive(Debug, Serialize)]
pub struct PurchaseResult {
    pub cosmetic_id: i64,
    pub cost: i64,
    pub balance: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotAssignment {
    pub slot: Slot,
    pub cosmetic_id: i64,
}

#[derive(Debug, Serialize)]
pub struct Loadout {
    pub id: i64,
    pub name: String,
    pub is_active: bool,
    pub created_at: String,
    pub slots: Vec<SlotAssignment>,
}

#[derive(Debug, Deserialize)]
pub struct CreateLoadoutRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UnequipRequest {
    pub slot: Slot,
}
