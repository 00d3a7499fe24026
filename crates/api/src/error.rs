use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use inkforge_core::error::{CoreError, FieldError};
use inkforge_pipeline::{PipelineError, StoreError};
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `inkforge_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An error from the generation pipeline.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(e) => Self::Database(e),
            other => Self::InternalError(other.to_string()),
        }
    }
}

/// Status, machine-readable code, and client-facing message for an error.
struct Classified {
    status: StatusCode,
    code: &'static str,
    message: String,
    details: Option<Vec<FieldError>>,
}

impl Classified {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: None,
        }
    }

    fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "An internal error occurred",
        )
    }
}

impl AppError {
    /// HTTP status and client-safe message for this error. Internal
    /// failures are logged here.
    pub fn status_and_message(&self) -> (StatusCode, String) {
        let classified = self.classify();
        (classified.status, classified.message)
    }

    fn classify(&self) -> Classified {
        match self {
            AppError::Core(core) => classify_core(core),
            AppError::Database(err) => classify_sqlx_error(err),
            AppError::Pipeline(err) => classify_pipeline(err),
            AppError::BadRequest(msg) => {
                Classified::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone())
            }
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                Classified::internal()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let classified = self.classify();

        let mut body = json!({
            "error": classified.message,
            "code": classified.code,
        });
        if let Some(details) = classified.details {
            body["details"] = json!(details);
        }

        (classified.status, axum::Json(body)).into_response()
    }
}

fn classify_core(core: &CoreError) -> Classified {
    match core {
        CoreError::NotFound { entity, id } => Classified::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => {
            Classified::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
        }
        CoreError::InvalidFields(fields) => Classified {
            details: Some(fields.clone()),
            ..Classified::new(
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                fields
                    .first()
                    .map_or("Validation failed", |f| f.message),
            )
        },
        CoreError::Conflict(msg) => Classified::new(StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::Unauthorized(msg) => {
            Classified::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
        }
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            Classified::internal()
        }
    }
}

fn classify_pipeline(err: &PipelineError) -> Classified {
    match err {
        PipelineError::Core(core) => classify_core(core),
        PipelineError::NotFound(id) => Classified::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("DesignRequest with id {id} not found"),
        ),
        PipelineError::InvalidState { id, status } => Classified::new(
            StatusCode::CONFLICT,
            "CONFLICT",
            format!("DesignRequest {id} is already {status}"),
        ),
        PipelineError::Store(StoreError::Database(db)) => classify_sqlx_error(db),
        PipelineError::Store(other) => {
            tracing::error!(error = %other, "Store error");
            Classified::internal()
        }
        PipelineError::Provider { id, source } => {
            tracing::error!(design_request_id = id, error = %source, "Generation provider error");
            Classified::new(
                StatusCode::BAD_GATEWAY,
                "GENERATION_FAILED",
                "Failed to start image generation",
            )
        }
        PipelineError::Interrupted(msg) => {
            tracing::error!(error = %msg, "Generation task interrupted");
            Classified::internal()
        }
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Foreign key violations map to 404 (the referenced parent is missing).
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> Classified {
    match err {
        sqlx::Error::RowNotFound => {
            Classified::new(StatusCode::NOT_FOUND, "NOT_FOUND", "Resource not found")
        }
        sqlx::Error::Database(db_err) => {
            match db_err.code().as_deref() {
                // PostgreSQL unique constraint violation
                Some("23505") => {
                    let constraint = db_err.constraint().unwrap_or("unknown");
                    if constraint.starts_with("uq_") {
                        return Classified::new(
                            StatusCode::CONFLICT,
                            "CONFLICT",
                            format!("Duplicate value violates unique constraint: {constraint}"),
                        );
                    }
                }
                // PostgreSQL foreign key violation
                Some("23503") => {
                    return Classified::new(
                        StatusCode::NOT_FOUND,
                        "NOT_FOUND",
                        "Referenced resource not found",
                    );
                }
                _ => {}
            }
            tracing::error!(error = %db_err, "Database error");
            Classified::internal()
        }
        other => {
            tracing::error!(error = %other, "Database error");
            Classified::internal()
        }
    }
}
