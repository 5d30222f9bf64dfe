use crate::app_state::AppState;
use crate::error::AppError;
use crate::models::currency::*;
use crate::services::ledger as service;
use ntex::web::{self, HttpResponse};

pub async fn get_transactions(
    state: web::types::State<AppState>,
    path: web::types::Path<i64>,
    query: web::types::Query<TransactionQuery>,
) -> Result<HttpResponse, AppError> {
    let limit = query.limit.unwrap_or(50);
    let history = service::get_transactions(&state.db, path.into_inner(), limit)?;
    Ok(HttpResponse::Ok().json(&history))
}

pub async fn audit_ledger(
    state: web::types::State<AppState>,
    path: web::types::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let audit = service::audit_ledger(&state.db, path.into_inner())?;
    Ok(HttpResponse::Ok().json(&audit))
}

pub async fn grant_currency(
    state: web::types::State<AppState>,
    path: web::types::Path<i64>,
    body: web::types::Json<CurrencyGrantRequest>,
) -> Result<HttpResponse, AppError> {
    let txn = service::grant_currency(&state.db, path.into_inner(), body.into_inner())?;
    Ok(HttpResponse::Ok().json(&txn))
}
