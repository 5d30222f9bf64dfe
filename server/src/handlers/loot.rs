use crate::app_state::AppState;
use crate::error::AppError;
use crate::services::loot as service;
use ntex::web::{self, HttpResponse};

pub async fn request_loot_drop(
    state: web::types::State<AppState>,
    path: web::types::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let mut rng = rand::thread_rng();
    let drop = service::generate_loot_drop(&state.db, path.into_inner(), &mut rng)?;
    Ok(HttpResponse::Ok().json(&drop))
}
