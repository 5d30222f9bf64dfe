use crate::db::Db;
use crate::services::leveling::Leveling;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Db>,
    pub leveling: Leveling,
}
