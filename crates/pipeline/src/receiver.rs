//! Completion Receiver.
//!
//! Applies provider completion callbacks keyed by job id. Updates are
//! guarded by the status machine, so redelivery and out-of-order delivery
//! leave the row unchanged. Callbacks for unknown jobs are discarded.

use std::sync::Arc;

use chrono::Utc;
use inkforge_core::prediction::{PredictionOutcome, PredictionPayload};
use inkforge_core::types::DbId;
use inkforge_core::webhook_signature::{SignatureVerifier, Verification};

use crate::error::{CallbackError, StoreError};
use crate::store::DesignRequestStore;

/// What a callback (or a reconciled prediction) did to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// The request moved to `completed`.
    Completed { design_request_id: DbId },
    /// The request moved to `failed`.
    Failed { design_request_id: DbId },
    /// The job is known but the request is already past this update.
    Unchanged { design_request_id: DbId },
    /// No request carries this job id.
    UnknownJob,
    /// Non-terminal status; nothing persisted.
    Acknowledged,
}

pub struct CompletionReceiver {
    store: Arc<dyn DesignRequestStore>,
    verifier: SignatureVerifier,
}

impl CompletionReceiver {
    pub fn new(store: Arc<dyn DesignRequestStore>, verifier: SignatureVerifier) -> Self {
        if !verifier.is_enforcing() {
            tracing::warn!(
                "Webhook signing secret not configured: provider callbacks are accepted \
                 without verification. Do not run like this in production."
            );
        }
        Self { store, verifier }
    }

    pub fn is_enforcing(&self) -> bool {
        self.verifier.is_enforcing()
    }

    /// Verify, parse, and apply one callback.
    ///
    /// Authentication failures never touch the store.
    pub async fn handle_callback(
        &self,
        raw_body: &str,
        signature_header: Option<&str>,
        timestamp_header: Option<&str>,
    ) -> Result<CallbackOutcome, CallbackError> {
        let verification = self
            .verifier
            .verify(
                raw_body,
                signature_header.unwrap_or_default(),
                timestamp_header.unwrap_or_default(),
                Utc::now(),
            )
            .inspect_err(|e| {
                tracing::warn!(error = %e, "Rejected provider callback with invalid signature");
            })?;
        if verification == Verification::Skipped {
            tracing::warn!("Accepting unverified provider callback");
        }

        let payload: PredictionPayload = serde_json::from_str(raw_body)?;
        let outcome = apply_outcome(self.store.as_ref(), &payload.id, payload.outcome()).await?;

        tracing::info!(job_id = %payload.id, status = ?payload.status, result = ?outcome, "Provider callback handled");
        Ok(outcome)
    }
}

/// Persist what a prediction document means for the request owning `job_id`.
pub async fn apply_outcome(
    store: &dyn DesignRequestStore,
    job_id: &str,
    outcome: PredictionOutcome,
) -> Result<CallbackOutcome, StoreError> {
    let updated = match &outcome {
        PredictionOutcome::InProgress => return Ok(CallbackOutcome::Acknowledged),
        PredictionOutcome::Succeeded { output_url } => {
            store.complete_by_job_id(job_id, output_url).await?
        }
        PredictionOutcome::Failed { reason } => {
            tracing::warn!(job_id, reason = %reason, "Prediction did not succeed");
            store.fail_by_job_id(job_id).await?
        }
    };

    if let Some(row) = updated {
        return Ok(match outcome {
            PredictionOutcome::Succeeded { .. } => CallbackOutcome::Completed {
                design_request_id: row.id,
            },
            _ => CallbackOutcome::Failed {
                design_request_id: row.id,
            },
        });
    }

    Ok(match store.find_by_job_id(job_id).await? {
        Some(row) => {
            tracing::debug!(
                design_request_id = row.id,
                job_id,
                status = %row.status,
                "Callback already applied"
            );
            CallbackOutcome::Unchanged {
                design_request_id: row.id,
            }
        }
        None => {
            tracing::debug!(job_id, "Discarding callback for unknown job");
            CallbackOutcome::UnknownJob
        }
    })
}
