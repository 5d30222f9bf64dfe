use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct MatchStats {
    pub kills: i64,
    pub deaths: i64,
    pub waves_survived: i64,
    pub scrap_earned: i64,
    pub data_earned: i64,
}

#[derive(Debug, Deserialize)]
pub struct PlayerMatchStats {
    pub player_id: i64,
    #[serde(flatten)]
    pub stats: MatchStats,
}

#[derive(Debug, Deserialize)]
pub struct PlayerRewardQuery {
    pub match_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct MatchReport {
    pub players: Vec<PlayerMatchStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRewardResult {
    pub player_id: i64,
    pub xp_gained: i64,
    pub experience: i64,
    pub level: i64,
    pub leveled_up: bool,
    pub currency_awarded: i64,
    pub currency_balance: i64,
    pub unlocked_cosmetic_ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct MatchRewardSummary {
    pub match_id: String,
    pub results: Vec<MatchRewardResult>,
}
