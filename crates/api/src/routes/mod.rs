pub mod design_request;
pub mod health;
pub mod project;

use axum::routing::post;
use axum::Router;

use crate::handlers::{generation, webhook};
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /design-requests                                 list, create
/// /design-requests/submit                          create + start generation
/// /design-requests/{id}                            get
/// /design-requests/{id}/status                     polling view
/// /design-requests/{id}/wait                       bounded long-poll
///
/// /generate                                        start generation (POST)
///
/// /webhooks/replicate                              provider callback (POST)
///
/// /projects                                        list, create
/// /projects/{id}                                   get, update, delete
/// /projects/{project_id}/designs                   list, save
/// /projects/{project_id}/designs/{id}              remove
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/design-requests", design_request::router())
        .route("/generate", post(generation::start))
        // Path must match `config::WEBHOOK_PATH` minus the `/api/v1` prefix.
        .route("/webhooks/replicate", post(webhook::replicate))
        .nest("/projects", project::router())
}
