//! Background reconciliation of stuck design requests.
//!
//! - `generating` rows that have not changed for `reconcile_after` are
//!   re-read from the provider and applied like a callback. This covers
//!   webhooks that were never delivered.
//! - `generating` rows older than `generation_timeout` whose job is still
//!   running (or cannot be fetched) are marked `failed`.
//! - `pending` / `processing` rows without a job id older than
//!   `generation_timeout` are marked `failed`; their submit flow is gone.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use inkforge_core::design_request::DesignRequestStatus;
use inkforge_core::prediction::PredictionOutcome;
use inkforge_core::types::Timestamp;
use inkforge_db::models::design_request::DesignRequest;
use tokio_util::sync::CancellationToken;

use crate::error::StoreError;
use crate::provider::GenerationProvider;
use crate::receiver::{apply_outcome, CallbackOutcome};
use crate::store::DesignRequestStore;

const DEFAULT_BATCH_SIZE: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepPolicy {
    pub interval: Duration,
    pub reconcile_after: Duration,
    pub generation_timeout: Duration,
    pub batch_size: i64,
}

impl Default for SweepPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            reconcile_after: Duration::from_secs(120),
            generation_timeout: Duration::from_secs(1800),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Counts from one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub completed: u32,
    pub failed: u32,
    pub timed_out: u32,
    pub still_running: u32,
    pub abandoned: u32,
}

impl SweepReport {
    pub fn changed(&self) -> u32 {
        self.completed + self.failed + self.timed_out + self.abandoned
    }
}

pub struct Sweeper {
    store: Arc<dyn DesignRequestStore>,
    provider: Arc<dyn GenerationProvider>,
    policy: SweepPolicy,
}

impl Sweeper {
    pub fn new(
        store: Arc<dyn DesignRequestStore>,
        provider: Arc<dyn GenerationProvider>,
        policy: SweepPolicy,
    ) -> Self {
        Self {
            store,
            provider,
            policy,
        }
    }

    /// Run sweeps on `policy.interval` until `cancel` is triggered.
    pub async fn run(self, cancel: CancellationToken) {
        tracing::info!(
            interval_secs = self.policy.interval.as_secs(),
            reconcile_after_secs = self.policy.reconcile_after.as_secs(),
            timeout_secs = self.policy.generation_timeout.as_secs(),
            "Design request sweeper started"
        );

        let mut interval = tokio::time::interval(self.policy.interval);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Design request sweeper stopping");
                    break;
                }
                _ = interval.tick() => {
                    match self.sweep_once(Utc::now()).await {
                        Ok(report) if report.changed() > 0 => {
                            tracing::info!(?report, "Sweeper: reconciled stale requests");
                        }
                        Ok(report) => {
                            tracing::debug!(still_running = report.still_running, "Sweeper: nothing to reconcile");
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Sweeper: pass failed");
                        }
                    }
                }
            }
        }
    }

    /// One reconciliation pass as of `now`.
    pub async fn sweep_once(&self, now: Timestamp) -> Result<SweepReport, StoreError> {
        let mut report = SweepReport::default();
        let reconcile_cutoff = cutoff(now, self.policy.reconcile_after);
        let timeout_cutoff = cutoff(now, self.policy.generation_timeout);

        let generating = self
            .store
            .list_stale(
                &[DesignRequestStatus::Generating],
                reconcile_cutoff,
                self.policy.batch_size,
            )
            .await?;
        for row in generating {
            self.reconcile(&row, timeout_cutoff, &mut report).await?;
        }

        let abandoned = self
            .store
            .list_stale(
                &[DesignRequestStatus::Pending, DesignRequestStatus::Processing],
                timeout_cutoff,
                self.policy.batch_size,
            )
            .await?;
        for row in abandoned {
            if self.store.fail_unsubmitted(row.id).await?.is_some() {
                tracing::warn!(design_request_id = row.id, status = %row.status, "Sweeper: abandoned request marked failed");
                report.abandoned += 1;
            }
        }

        Ok(report)
    }

    async fn reconcile(
        &self,
        row: &DesignRequest,
        timeout_cutoff: Timestamp,
        report: &mut SweepReport,
    ) -> Result<(), StoreError> {
        let Some(job_id) = row.external_job_id.as_deref() else {
            return Ok(());
        };
        let timed_out = row.updated_at < timeout_cutoff;

        let outcome = match self.provider.get_prediction(job_id).await {
            Ok(prediction) => prediction.outcome(),
            Err(e) => {
                tracing::warn!(design_request_id = row.id, job_id, error = %e, "Sweeper: could not fetch prediction");
                PredictionOutcome::InProgress
            }
        };

        if outcome == PredictionOutcome::InProgress {
            if timed_out {
                if self.store.fail_by_job_id(job_id).await?.is_some() {
                    tracing::warn!(design_request_id = row.id, job_id, "Sweeper: generation timed out");
                    report.timed_out += 1;
                }
            } else {
                report.still_running += 1;
            }
            return Ok(());
        }

        match apply_outcome(self.store.as_ref(), job_id, outcome).await? {
            CallbackOutcome::Completed { .. } => report.completed += 1,
            CallbackOutcome::Failed { .. } => report.failed += 1,
            _ => {}
        }
        Ok(())
    }
}

/// `now - age`, saturating at the earliest representable instant.
fn cutoff(now: Timestamp, age: Duration) -> Timestamp {
    chrono::Duration::from_std(age)
        .ok()
        .and_then(|age| now.checked_sub_signed(age))
        .unwrap_or(chrono::DateTime::<Utc>::MIN_UTC)
}
