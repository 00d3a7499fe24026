use inkforge_core::design_request::DesignRequestStatus;
use inkforge_core::error::CoreError;
use inkforge_core::types::DbId;
use inkforge_core::webhook_signature::SignatureError;
use inkforge_replicate::ReplicateError;

/// Failure of the relational store behind [`crate::store::DesignRequestStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by the orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Payload validation failed; nothing was persisted.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Design request {0} not found")]
    NotFound(DbId),

    /// The request is no longer in a state that accepts this operation.
    #[error("Design request {id} is {status}")]
    InvalidState { id: DbId, status: DesignRequestStatus },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Job submission failed. The request has been marked `failed`.
    #[error("Generation provider error for design request {id}: {source}")]
    Provider {
        id: DbId,
        #[source]
        source: ReplicateError,
    },

    /// The submit task panicked or was aborted before returning.
    #[error("Generation task did not complete: {0}")]
    Interrupted(String),
}

/// Errors surfaced by the completion receiver.
#[derive(Debug, thiserror::Error)]
pub enum CallbackError {
    #[error("Callback rejected: {0}")]
    Unauthenticated(#[from] SignatureError),

    #[error("Callback body is not a prediction document: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
