use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sysinfo::System;
use tracing::instrument;

use crate::models::health::{HealthChecks, HealthResponse, MemoryCheck};
use crate::state::AppState;

/// Process health check, unauthenticated.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    operation_id = "health",
    summary = "Process health and memory status",
    description = "Reports process status, uptime, and a memory check. \
                   Returns 503 when memory usage reaches 90%.",
    responses(
        (status = 200, description = "Healthy", body = HealthResponse),
        (status = 503, description = "Unhealthy", body = HealthResponse),
    ),
)]
#[instrument(skip(state))]
pub async fn health(State(state): State<AppState>) -> Response {
    let mut sys = System::new();
    sys.refresh_memory();

    let total = sys.total_memory();
    let used = sys.used_memory();
    let percentage = if total == 0 {
        0.0
    } else {
        used as f64 * 100.0 / total as f64
    };

    let memory_status = if percentage >= 90.0 {
        "error"
    } else if percentage >= 75.0 {
        "warning"
    } else {
        "ok"
    };

    let status = if memory_status == "error" {
        "error"
    } else {
        "ok"
    };

    let body = HealthResponse {
        status,
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.started_at.elapsed().as_secs(),
        checks: HealthChecks {
            memory: MemoryCheck {
                status: memory_status,
                used: used / 1024 / 1024,
                total: total / 1024 / 1024,
                percentage: percentage.round() as u64,
            },
        },
    };

    let code = if status == "ok" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(body)).into_response()
}
