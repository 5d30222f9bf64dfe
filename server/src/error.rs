use ntex::http::StatusCode;
use ntex::web::{HttpResponse, WebResponseError};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("cosmetic {0} not found")]
    CosmeticNotFound(i64),

    #[error("loadout {0} not found")]
    LoadoutNotFound(i64),

    #[error("cosmetic {0} already owned")]
    CosmeticAlreadyOwned(i64),

    #[error("cosmetic {0} not owned")]
    CosmeticNotOwned(i64),

    #[error("insufficient currency: balance {balance}, required {required}")]
    InsufficientCurrency { balance: i64, required: i64 },

    #[error("invalid match stats: {0}")]
    InvalidStats(String),

    #[error("no active loot tables")]
    NoActiveLootTables,

    #[error("no loot dropped from any table")]
    NoDropFromAnyTable,

    #[error("loot table {0} has no entries")]
    EmptyLootTable(i64),

    #[error("loot table {0} has non-positive total weight")]
    NonPositiveWeight(i64),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn http_status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_)
            | AppError::CosmeticNotFound(_)
            | AppError::LoadoutNotFound(_)
            | AppError::NoDropFromAnyTable => StatusCode::NOT_FOUND,
            AppError::CosmeticAlreadyOwned(_) => StatusCode::CONFLICT,
            AppError::CosmeticNotOwned(_) => StatusCode::FORBIDDEN,
            AppError::InsufficientCurrency { .. } => StatusCode::PAYMENT_REQUIRED,
            AppError::InvalidStats(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NoActiveLootTables
            | AppError::EmptyLootTable(_)
            | AppError::NonPositiveWeight(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Db(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn is_internal(&self) -> bool {
        matches!(self, AppError::Db(_) | AppError::Internal(_))
    }
}

/// Logs storage and internal failures with the player and operation they
/// happened in; business errors pass through untouched.
pub fn log_failure(player_id: i64, operation: &'static str) -> impl Fn(AppError) -> AppError {
    move |err| {
        if err.is_internal() {
            tracing::error!(player_id, operation, error = %err, "storage failure");
        }
        err
    }
}

impl WebResponseError for AppError {
    fn error_response(&self, _: &ntex::web::HttpRequest) -> HttpResponse {
        let status = self.http_status();
        let message = if self.is_internal() {
            "Internal error".to_string()
        } else {
            self.to_string()
        };
        HttpResponse::build(status).json(&serde_json::json!({ "error": message }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_errors_map_to_client_statuses() {
        assert_eq!(AppError::CosmeticNotFound(1).http_status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::CosmeticAlreadyOwned(1).http_status(), StatusCode::CONFLICT);
        assert_eq!(AppError::CosmeticNotOwned(1).http_status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::InsufficientCurrency { balance: 0, required: 10 }.http_status(),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(AppError::InvalidStats("kills".into()).http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::EmptyLootTable(3).http_status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_storage_errors_are_internal() {
        let err = AppError::from(rusqlite::Error::QueryReturnedNoRows);
        assert_eq!(err.http_status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.is_internal());
        assert!(!AppError::NoDropFromAnyTable.is_internal());
    }
}
