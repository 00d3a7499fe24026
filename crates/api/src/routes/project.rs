//! Route definitions for the `/projects` resource.
//!
//! Also nests saved designs under `/projects/{project_id}/designs`.

use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::{project, project_design};
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET    /                                  -> list
/// POST   /                                  -> create
/// GET    /{id}                              -> get_by_id
/// PUT    /{id}                              -> update
/// PATCH  /{id}                              -> update
/// DELETE /{id}                              -> delete
///
/// GET    /{project_id}/designs              -> list
/// POST   /{project_id}/designs              -> create
/// DELETE /{project_id}/designs/{id}         -> delete
/// ```
pub fn router() -> Router<AppState> {
    let design_routes = Router::new()
        .route("/", get(project_design::list).post(project_design::create))
        .route("/{id}", delete(project_design::delete));

    Router::new()
        .route("/", get(project::list).post(project::create))
        .route(
            "/{id}",
            get(project::get_by_id)
                .put(project::update)
                .patch(project::update)
                .delete(project::delete),
        )
        .nest("/{project_id}/designs", design_routes)
}
