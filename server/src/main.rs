mod app_state;
mod config;
mod db;
mod error;
mod handlers;
mod models;
mod services;
mod validation;

use app_state::AppState;
use config::{LogFormat, ServerConfig};
use db::Db;
use ntex::web;
use ntex_cors::Cors;
use services::leveling::Leveling;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[ntex::main]
async fn main() -> std::io::Result<()> {
    let config = ServerConfig::from_env();
    init_tracing(config.log_format);

    let db = Db::open(&config.database_path).map_err(|e| {
        tracing::error!(path = %config.database_path, error = %e, "failed to open database");
        std::io::Error::other(e)
    })?;
    let state = AppState {
        db: Arc::new(db),
        leveling: Leveling::new(config.base_xp_per_level),
    };

    tracing::info!(
        addr = %config.bind_addr(),
        base_xp_per_level = state.leveling.base_xp_per_level(),
        "progression server starting"
    );

    web::HttpServer::new(move || {
        web::App::new()
            .state(state.clone())
            .wrap(
                Cors::new()
                    .allowed_origin("*")
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec!["Content-Type"])
                    .max_age(3600)
                    .finish(),
            )
            // Health check
            .route("/api/health", web::get().to(health))
            // Progression
            .route(
                "/api/players/{player_id}/progression",
                web::get().to(handlers::progression::get_progression),
            )
            .route(
                "/api/players/{player_id}/prestige",
                web::post().to(handlers::progression::prestige_player),
            )
            // Cosmetics and loadouts
            .route("/api/cosmetics", web::get().to(handlers::cosmetics::get_catalog))
            .route(
                "/api/players/{player_id}/cosmetics",
                web::get().to(handlers::cosmetics::get_owned_cosmetics),
            )
            .route(
                "/api/players/{player_id}/cosmetics/purchase",
                web::post().to(handlers::cosmetics::purchase_cosmetic),
            )
            .route(
                "/api/players/{player_id}/cosmetics/equip",
                web::post().to(handlers::cosmetics::equip_cosmetic),
            )
            .service(
                web::resource("/api/players/{player_id}/loadouts")
                    .route(web::get().to(handlers::cosmetics::list_loadouts))
                    .route(web::post().to(handlers::cosmetics::create_loadout)),
            )
            .route(
                "/api/players/{player_id}/loadouts/unequip",
                web::post().to(handlers::cosmetics::unequip_slot),
            )
            .route(
                "/api/players/{player_id}/loadouts/{loadout_id}/activate",
                web::post().to(handlers::cosmetics::activate_loadout),
            )
            // Loot
            .route(
                "/api/players/{player_id}/loot",
                web::post().to(handlers::loot::request_loot_drop),
            )
            // Currency ledger
            .route(
                "/api/players/{player_id}/currency/transactions",
                web::get().to(handlers::currency::get_transactions),
            )
            .route(
                "/api/players/{player_id}/currency/audit",
                web::get().to(handlers::currency::audit_ledger),
            )
            .route(
                "/api/players/{player_id}/currency/grant",
                web::post().to(handlers::currency::grant_currency),
            )
            // Match service callbacks
            .route(
                "/api/players/{player_id}/match-rewards",
                web::post().to(handlers::matches::submit_player_rewards),
            )
            .route(
                "/api/matches/{match_id}/rewards",
                web::post().to(handlers::matches::submit_match_rewards),
            )
    })
    .bind(config.bind_addr())?
    .run()
    .await
}

async fn health() -> web::HttpResponse {
    web::HttpResponse::Ok().json(&serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
