use crate::app_state::AppState;
use crate::error::AppError;
use crate::models::cosmetic::*;
use crate::services::cosmetics as service;
use ntex::web::{self, HttpResponse};

pub async fn get_catalog(state: web::types::State<AppState>) -> Result<HttpResponse, AppError> {
    let catalog = service::get_catalog(&state.db)?;
    Ok(HttpResponse::Ok().json(&catalog))
}

pub async fn get_owned_cosmetics(
    state: web::types::State<AppState>,
    path: web::types::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let owned = service::get_owned_cosmetics(&state.db, path.into_inner())?;
    Ok(HttpResponse::Ok().json(&owned))
}

pub async fn purchase_cosmetic(
    state: web::types::State<AppState>,
    path: web::types::Path<i64>,
    body: web::types::Json<CosmeticRequest>,
) -> Result<HttpResponse, AppError> {
    let result = service::purchase_cosmetic(&state.db, path.into_inner(), body.cosmetic_id)?;
    Ok(HttpResponse::Ok().json(&result))
}

pub async fn equip_cosmetic(
    state: web::types::State<AppState>,
    path: web::types::Path<i64>,
    body: web::types::Json<CosmeticRequest>,
) -> Result<HttpResponse, AppError> {
    service::equip_cosmetic(&state.db, path.into_inner(), body.cosmetic_id)?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn list_loadouts(
    state: web::types::State<AppState>,
    path: web::types::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let loadouts = service::list_loadouts(&state.db, path.into_inner())?;
    Ok(HttpResponse::Ok().json(&loadouts))
}

pub async fn create_loadout(
    state: web::types::State<AppState>,
    path: web::types::Path<i64>,
    body: web::types::Json<CreateLoadoutRequest>,
) -> Result<HttpResponse, AppError> {
    let loadout = service::create_loadout(&state.db, path.into_inner(), body.into_inner())?;
    Ok(HttpResponse::Created().json(&loadout))
}

pub async fn activate_loadout(
    state: web::types::State<AppState>,
    path: web::types::Path<(i64, i64)>,
) -> Result<HttpResponse, AppError> {
    let (player_id, loadout_id) = path.into_inner();
    service::activate_loadout(&state.db, player_id, loadout_id)?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn unequip_slot(
    state: web::types::State<AppState>,
    path: web::types::Path<i64>,
    body: web::types::Json<UnequipRequest>,
) -> Result<HttpResponse, AppError> {
    service::unequip_slot(&state.db, path.into_inner(), body.slot)?;
    Ok(HttpResponse::NoContent().finish())
}
