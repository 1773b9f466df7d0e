use std::time::Instant;

use sea_orm::DatabaseConnection;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    /// Process start time, reported by the health endpoint.
    pub started_at: Instant,
}
