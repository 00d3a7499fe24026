//! Handlers for designs saved into a project.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use inkforge_core::error::CoreError;
use inkforge_core::types::DbId;
use inkforge_db::models::project_design::{CreateProjectDesign, ProjectDesign};
use inkforge_db::repositories::{ProjectDesignRepo, ProjectRepo};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::handlers::project::not_found;
use crate::state::AppState;

/// GET /api/v1/projects/{id}/designs
pub async fn list(
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<ProjectDesign>>>> {
    ProjectRepo::find_by_id(&state.pool, project_id)
        .await?
        .ok_or(not_found(project_id))?;
    let designs = ProjectDesignRepo::list_by_project(&state.pool, project_id).await?;
    Ok(Json(DataResponse { data: designs }))
}

/// POST /api/v1/projects/{id}/designs
///
/// With `design_request_id`, omitted fields are copied from that request,
/// which must have completed.
pub async fn create(
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Json(input): Json<CreateProjectDesign>,
) -> AppResult<(StatusCode, Json<DataResponse<ProjectDesign>>)> {
    ProjectRepo::find_by_id(&state.pool, project_id)
        .await?
        .ok_or(not_found(project_id))?;

    let source = match input.design_request_id {
        Some(id) => Some(state.store.find_by_id(id).await?.ok_or(AppError::Core(
            CoreError::NotFound {
                entity: "DesignRequest",
                id,
            },
        ))?),
        None => None,
    };

    let new_design = input.resolve(project_id, source.as_ref())?;
    let design = ProjectDesignRepo::create(&state.pool, &new_design).await?;
    tracing::info!(
        project_id,
        project_design_id = design.id,
        design_request_id = ?design.design_request_id,
        "Design saved to project",
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: design })))
}

/// DELETE /api/v1/projects/{id}/designs/{design_id}
pub async fn delete(
    State(state): State<AppState>,
    Path((project_id, design_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    if ProjectDesignRepo::delete(&state.pool, project_id, design_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: "ProjectDesign",
            id: design_id,
        }))
    }
}
