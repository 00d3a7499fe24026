//! Handler for starting generation on an existing design request.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use inkforge_core::design_request::DesignPayload;
use inkforge_core::types::DbId;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::state::AppState;

/// Body of `POST /generate`: the request id plus the wizard fields.
#[derive(Debug, Deserialize)]
pub struct StartGeneration {
    pub id: DbId,
    #[serde(flatten)]
    pub payload: DesignPayload,
}

/// POST /api/v1/generate
///
/// Responds `{ "success": true, "prediction": ... }` once the provider has
/// accepted the job, or `{ "success": false, "error": ... }` with a
/// client-safe message.
pub async fn start(
    State(state): State<AppState>,
    body: Result<Json<StartGeneration>, JsonRejection>,
) -> (StatusCode, Json<Value>) {
    let Json(input) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "success": false, "error": rejection.body_text() })),
            )
        }
    };

    match state
        .orchestrator
        .start_generation(input.id, &input.payload)
        .await
    {
        Ok(generation) => (
            StatusCode::OK,
            Json(json!({ "success": true, "prediction": generation.prediction })),
        ),
        Err(err) => {
            let (status, message) = AppError::from(err).status_and_message();
            (status, Json(json!({ "success": false, "error": message })))
        }
    }
}
