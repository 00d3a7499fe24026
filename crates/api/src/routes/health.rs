//! Liveness probe for load balancers and the studio front end.
//!
//! Always answers 200 so a database blip does not take the instance out of
//! rotation while in-flight generations can still complete through the
//! provider callback.

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when PostgreSQL is unreachable.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    /// How finished generations reach this service: `webhook` when a public
    /// callback URL is configured, otherwise `sweeper`.
    pub completion: &'static str,
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = inkforge_db::health_check(&state.pool).await.is_ok();
    let completion = if state.config.callback_url.is_some() {
        "webhook"
    } else {
        "sweeper"
    };

    Json(HealthResponse {
        status: if db_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        completion,
    })
}

/// Mounted at the root, outside `/api/v1`.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
