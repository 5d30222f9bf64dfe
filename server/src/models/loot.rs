use super::cosmetic::CosmeticItem;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct LootTable {
    pub id: i64,
    pub name: String,
    pub drop_probability: f64,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LootTableEntry {
    pub id: i64,
    pub loot_table_id: i64,
    pub cosmetic_id: i64,
    pub weight: i64,
    pub min_quantity: i64,
    pub max_quantity: i64,
}

#[derive(Debug, Serialize)]
pub struct LootDrop {
    pub loot_table_id: i64,
    /// The player already owned the item; nothing new was granted.
    pub duplicate: bool,
    pub cosmetic: CosmeticItem,
}
