//! Handlers for the `/design-requests` resource.

use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use inkforge_core::design_request::DesignPayload;
use inkforge_core::error::CoreError;
use inkforge_core::search::{clamp_limit, clamp_offset, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use inkforge_core::types::DbId;
use inkforge_db::models::design_request::{DesignRequest, DesignRequestStatusView};
use inkforge_pipeline::wait::wait_for_terminal;

use crate::error::{AppError, AppResult};
use crate::query::{PaginationParams, WaitParams};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/design-requests
///
/// Validate and store the wizard payload. The request stays `pending` until
/// generation is started.
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<DesignPayload>,
) -> AppResult<(StatusCode, Json<DataResponse<DesignRequest>>)> {
    let request = state.orchestrator.create_request(&payload).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: request })))
}

/// POST /api/v1/design-requests/submit
///
/// Create the request and start generation in one call.
pub async fn submit(
    State(state): State<AppState>,
    Json(payload): Json<DesignPayload>,
) -> AppResult<(StatusCode, Json<DataResponse<DesignRequest>>)> {
    let generation = state.orchestrator.submit(&payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: generation.request,
        }),
    ))
}

/// GET /api/v1/design-requests
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<DesignRequest>>>> {
    let limit = clamp_limit(params.limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);
    let offset = clamp_offset(params.offset);
    let requests = state.store.list(limit, offset).await?;
    Ok(Json(DataResponse { data: requests }))
}

/// GET /api/v1/design-requests/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<DesignRequest>>> {
    let request = find(&state, id).await?;
    Ok(Json(DataResponse { data: request }))
}

/// GET /api/v1/design-requests/{id}/status
///
/// Polling view. Always read from the store, never cached.
pub async fn status(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<DesignRequestStatusView>>> {
    let request = find(&state, id).await?;
    Ok(Json(DataResponse {
        data: DesignRequestStatusView::from(&request),
    }))
}

/// GET /api/v1/design-requests/{id}/wait?timeout_secs=
///
/// Hold the request until the design reaches a terminal status or the wait
/// budget runs out, then return the latest status view either way.
pub async fn wait(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<WaitParams>,
) -> AppResult<Json<DataResponse<DesignRequestStatusView>>> {
    let policy = state
        .config
        .wait_policy(params.timeout_secs.map(Duration::from_secs));
    let outcome = wait_for_terminal(state.store.as_ref(), id, policy).await?;
    let request = outcome.into_inner();
    Ok(Json(DataResponse {
        data: DesignRequestStatusView::from(&request),
    }))
}

async fn find(state: &AppState, id: DbId) -> AppResult<DesignRequest> {
    state
        .store
        .find_by_id(id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "DesignRequest",
            id,
        }))
}
