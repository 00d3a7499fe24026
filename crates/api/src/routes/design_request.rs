//! Route definitions for the `/design-requests` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::design_request;
use crate::state::AppState;

/// Routes mounted at `/design-requests`.
///
/// ```text
/// GET    /                 -> list
/// POST   /                 -> create
/// POST   /submit           -> submit
/// GET    /{id}             -> get_by_id
/// GET    /{id}/status      -> status
/// GET    /{id}/wait        -> wait
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(design_request::list).post(design_request::create),
        )
        .route("/submit", post(design_request::submit))
        .route("/{id}", get(design_request::get_by_id))
        .route("/{id}/status", get(design_request::status))
        .route("/{id}/wait", get(design_request::wait))
}
