use crate::app_state::AppState;
use crate::error::AppError;
use crate::models::match_reward::{MatchReport, MatchStats, PlayerRewardQuery};
use crate::services::match_rewards as service;
use ntex::web::{self, HttpResponse};
use uuid::Uuid;

pub async fn submit_match_rewards(
    state: web::types::State<AppState>,
    path: web::types::Path<Uuid>,
    body: web::types::Json<MatchReport>,
) -> Result<HttpResponse, AppError> {
    let summary = service::award_match(
        &state.db,
        &state.leveling,
        path.into_inner(),
        body.into_inner(),
    )?;
    Ok(HttpResponse::Ok().json(&summary))
}

pub async fn submit_player_rewards(
    state: web::types::State<AppState>,
    path: web::types::Path<i64>,
    query: web::types::Query<PlayerRewardQuery>,
    body: web::types::Json<MatchStats>,
) -> Result<HttpResponse, AppError> {
    let result = service::award_match_rewards(
        &state.db,
        &state.leveling,
        path.into_inner(),
        body.into_inner(),
        query.match_id,
    )?;
    Ok(HttpResponse::Ok().json(&result))
}
