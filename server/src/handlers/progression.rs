use crate::app_state::AppState;
use crate::error::AppError;
use crate::services::{prestige, progression as service};
use ntex::web::{self, HttpResponse};

pub async fn get_progression(
    state: web::types::State<AppState>,
    path: web::types::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let player_id = path.into_inner();
    let view = service::get_progression(&state.db, &state.leveling, player_id)?;
    Ok(HttpResponse::Ok().json(&view))
}

pub async fn prestige_player(
    state: web::types::State<AppState>,
    path: web::types::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let player_id = path.into_inner();
    let result = prestige::prestige_player(&state.db, player_id)?;
    Ok(HttpResponse::Ok().json(&result))
}
