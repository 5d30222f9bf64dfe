use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerProgression {
    pub player_id: i64,
    pub level: i64,
    pub experience: i64,
    pub prestige_tier: i64,
    pub currency_balance: i64,
    pub matches_played: i64,
    pub total_kills: i64,
    pub total_deaths: i64,
    pub total_waves_survived: i64,
    pub total_scrap_earned: i64,
    pub total_currency_earned: i64,
    pub last_updated: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelProgress {
    pub level: i64,
    pub xp_into_level: i64,
    pub xp_to_next_level: i64,
}

#[derive(Debug, Serialize)]
pub struct ProgressionView {
    #[serde(flatten)]
    pub progression: PlayerProgression,
    pub xp_into_level: i64,
    pub xp_to_next_level: i64,
}

#[derive(Debug, Serialize)]
pub struct PrestigeResult {
    pub prestige_tier: i64,
    pub granted_cosmetic_ids: Vec<i64>,
}
