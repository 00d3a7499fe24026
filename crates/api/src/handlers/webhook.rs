//! Provider completion callback handler.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use inkforge_core::webhook_signature::{SIGNATURE_HEADER, TIMESTAMP_HEADER};
use inkforge_pipeline::CallbackError;

use crate::response::Ack;
use crate::state::AppState;

/// POST /api/v1/webhooks/replicate
///
/// Always answers `{ "success": bool }`. Rejections carry no detail; the
/// reason is logged server-side.
pub async fn replicate(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Ack>) {
    let Ok(raw_body) = std::str::from_utf8(&body) else {
        tracing::warn!("Provider callback body is not UTF-8");
        return reply(StatusCode::BAD_REQUEST, false);
    };

    match state
        .receiver
        .handle_callback(
            raw_body,
            header_str(&headers, SIGNATURE_HEADER),
            header_str(&headers, TIMESTAMP_HEADER),
        )
        .await
    {
        Ok(_) => reply(StatusCode::OK, true),
        Err(CallbackError::Unauthenticated(_)) => reply(StatusCode::UNAUTHORIZED, false),
        Err(CallbackError::Malformed(e)) => {
            tracing::warn!(error = %e, "Malformed provider callback");
            reply(StatusCode::BAD_REQUEST, false)
        }
        Err(CallbackError::Store(e)) => {
            tracing::error!(error = %e, "Failed to apply provider callback");
            reply(StatusCode::INTERNAL_SERVER_ERROR, false)
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn reply(status: StatusCode, success: bool) -> (StatusCode, Json<Ack>) {
    (status, Json(Ack { success }))
}
