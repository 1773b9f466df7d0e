use chrono::{DateTime, Utc};
use serde::Serialize;

/// Memory usage check. Status thresholds: ok < 75%, warning < 90%,
/// error >= 90%.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MemoryCheck {
    /// One of: ok, warning, error
    pub status: &'static str,
    /// Used memory in MB.
    pub used: u64,
    /// Total memory in MB.
    pub total: u64,
    /// Used memory as a rounded percentage of total.
    pub percentage: u64,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthChecks {
    pub memory: MemoryCheck,
}

/// Health endpoint body. Served with HTTP 200 unless `status` is `error`,
/// then 503.
#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    /// One of: ok, error
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub version: &'static str,
    /// Process uptime in seconds.
    pub uptime: u64,
    pub checks: HealthChecks,
}
