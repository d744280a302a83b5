//! Gateway Health API
//!
//! Liveness only; no dependency checks.

use axum::Json;
use serde::Serialize;

use formlens_config::defaults::SERVICE_NAME;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler for `GET /health`
pub async fn get_health() -> Json<HealthReport> {
    Json(HealthReport {
        status: "healthy",
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
    })
}
