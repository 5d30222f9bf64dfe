use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    MatchReward,
    Purchase,
    PrestigeReward,
    AdminGrant,
    Refund,
    Other,
}

text_enum!(TransactionKind {
    MatchReward => "match_reward",
    Purchase => "purchase",
    PrestigeReward => "prestige_reward",
    AdminGrant => "admin_grant",
    Refund => "refund",
    Other => "other",
});

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrencyTransaction {
    pub id: i64,
    pub player_id: i64,
    pub amount: i64,
    pub balance_after: i64,
    pub kind: TransactionKind,
    pub reference_id: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct TransactionQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct LedgerAudit {
    pub player_id: i64,
    pub balance: i64,
    pub replayed_balance: i64,
    pub transaction_count: i64,
    /// Every row's `balance_after` matched the running sum, and the final
    /// sum matches the stored balance.
    pub consistent: bool,
}

#[derive(Debug, Deserialize)]
pub struct CurrencyGrantRequest {
    pub amount: i64,
    pub kind: Option<TransactionKind>,
    pub reference_id: Option<String>,
}
