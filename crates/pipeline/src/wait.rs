//! Polling fallback: wait until a design request reaches a terminal state.

use inkforge_core::polling::{poll_until, PollOutcome, PollPolicy};
use inkforge_core::types::DbId;
use inkforge_db::models::design_request::DesignRequest;

use crate::error::PipelineError;
use crate::store::DesignRequestStore;

/// Re-read the request from the store until it is `completed` or `failed`
/// or the policy's attempt budget is spent. Every attempt is a fresh read.
pub async fn wait_for_terminal(
    store: &dyn DesignRequestStore,
    id: DbId,
    policy: PollPolicy,
) -> Result<PollOutcome<DesignRequest>, PipelineError> {
    poll_until(
        policy,
        || async move {
            store
                .find_by_id(id)
                .await?
                .ok_or(PipelineError::NotFound(id))
        },
        |row: &DesignRequest| row.status.is_terminal(),
    )
    .await
}
