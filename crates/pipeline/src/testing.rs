//! In-memory fakes for the pipeline's collaborators.
//!
//! The store enforces the same guards as the PostgreSQL repository so
//! tests exercise the real status machine.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use inkforge_cloud::{ArtifactError, ArtifactStore};
use inkforge_core::design_request::DesignRequestStatus;
use inkforge_core::prediction::PredictionStatus;
use inkforge_core::types::{DbId, Timestamp};
use inkforge_db::models::design_request::{CreateDesignRequest, DesignRequest};
use inkforge_replicate::{CreatePrediction, Prediction, ReplicateError};

use crate::error::StoreError;
use crate::provider::GenerationProvider;
use crate::store::DesignRequestStore;

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<DesignRequest>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn get(&self, id: DbId) -> Option<DesignRequest> {
        self.rows.lock().unwrap().iter().find(|r| r.id == id).cloned()
    }

    pub fn all(&self) -> Vec<DesignRequest> {
        self.rows.lock().unwrap().clone()
    }

    /// Backdate a row, as if it had not been touched since `at`.
    pub fn set_updated_at(&self, id: DbId, at: Timestamp) {
        if let Some(row) = self.rows.lock().unwrap().iter_mut().find(|r| r.id == id) {
            row.updated_at = at;
        }
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("memory store switched off".into()))
        } else {
            Ok(())
        }
    }

    /// Apply `mutate` to the first row matching `predicate`, bumping
    /// `updated_at` like the database trigger does.
    fn update_where(
        &self,
        predicate: impl Fn(&DesignRequest) -> bool,
        mutate: impl FnOnce(&mut DesignRequest),
    ) -> Option<DesignRequest> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows.iter_mut().find(|r| predicate(&**r))?;
        mutate(row);
        row.updated_at = Utc::now();
        Some(row.clone())
    }
}

fn allowed(row: &DesignRequest, to: DesignRequestStatus) -> bool {
    to.predecessors().contains(&row.status)
}

#[async_trait]
impl DesignRequestStore for MemoryStore {
    async fn create(&self, input: &CreateDesignRequest) -> Result<DesignRequest, StoreError> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        let now = Utc::now();
        let row = DesignRequest {
            id: rows.len() as DbId + 1,
            style: input.style.clone(),
            body_placement: input.body_placement.clone(),
            detail_level: input.detail_level.clone(),
            modifier: input.modifier.clone(),
            negative_prompt: input.negative_prompt.clone(),
            description: input.description.clone(),
            reference_image_url: input.reference_image_url.clone(),
            freestyle_drawing_url: input.freestyle_drawing_url.clone(),
            external_job_id: None,
            generated_image_url: None,
            status: DesignRequestStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<DesignRequest>, StoreError> {
        self.check()?;
        Ok(self.get(id))
    }

    async fn find_by_job_id(&self, job_id: &str) -> Result<Option<DesignRequest>, StoreError> {
        self.check()?;
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.external_job_id.as_deref() == Some(job_id))
            .cloned())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<DesignRequest>, StoreError> {
        self.check()?;
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .rev()
            .skip(usize::try_from(offset).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }

    async fn transition(
        &self,
        id: DbId,
        to: DesignRequestStatus,
    ) -> Result<Option<DesignRequest>, StoreError> {
        self.check()?;
        Ok(self.update_where(|r| r.id == id && allowed(r, to), |r| r.status = to))
    }

    async fn record_submission(
        &self,
        id: DbId,
        job_id: &str,
    ) -> Result<Option<DesignRequest>, StoreError> {
        self.check()?;
        let to = DesignRequestStatus::Generating;
        Ok(self.update_where(
            |r| r.id == id && r.external_job_id.is_none() && allowed(r, to),
            |r| {
                r.external_job_id = Some(job_id.to_string());
                r.status = to;
            },
        ))
    }

    async fn fail_unsubmitted(&self, id: DbId) -> Result<Option<DesignRequest>, StoreError> {
        self.check()?;
        Ok(self.update_where(
            |r| {
                r.id == id
                    && r.external_job_id.is_none()
                    && matches!(
                        r.status,
                        DesignRequestStatus::Pending | DesignRequestStatus::Processing
                    )
            },
            |r| r.status = DesignRequestStatus::Failed,
        ))
    }

    async fn complete_by_job_id(
        &self,
        job_id: &str,
        generated_image_url: &str,
    ) -> Result<Option<DesignRequest>, StoreError> {
        self.check()?;
        let to = DesignRequestStatus::Completed;
        Ok(self.update_where(
            |r| r.external_job_id.as_deref() == Some(job_id) && allowed(r, to),
            |r| {
                r.status = to;
                r.generated_image_url = Some(generated_image_url.to_string());
            },
        ))
    }

    async fn fail_by_job_id(&self, job_id: &str) -> Result<Option<DesignRequest>, StoreError> {
        self.check()?;
        let to = DesignRequestStatus::Failed;
        Ok(self.update_where(
            |r| r.external_job_id.as_deref() == Some(job_id) && allowed(r, to),
            |r| r.status = to,
        ))
    }

    async fn list_stale(
        &self,
        statuses: &[DesignRequestStatus],
        updated_before: Timestamp,
        limit: i64,
    ) -> Result<Vec<DesignRequest>, StoreError> {
        self.check()?;
        let mut rows: Vec<DesignRequest> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| statuses.contains(&r.status) && r.updated_at < updated_before)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.updated_at);
        rows.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(rows)
    }
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Build a provider prediction document.
pub fn prediction(id: &str, status: PredictionStatus, output: Option<serde_json::Value>) -> Prediction {
    Prediction {
        id: id.to_string(),
        status,
        output,
        error: None,
        webhook: None,
        created_at: None,
    }
}

/// Provider whose create responses are scripted in order. Unscripted
/// creates are accepted with a generated job id.
#[derive(Default)]
pub struct ScriptedProvider {
    creates: Mutex<VecDeque<Result<Prediction, ReplicateError>>>,
    predictions: Mutex<HashMap<String, Prediction>>,
    calls: Mutex<Vec<CreatePrediction>>,
    create_delay: Mutex<Option<Duration>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next create returns job `job_id` in `starting`.
    pub fn accept_next(&self, job_id: &str) -> &Self {
        self.creates
            .lock()
            .unwrap()
            .push_back(Ok(prediction(job_id, PredictionStatus::Starting, None)));
        self
    }

    /// Next create fails with an API error.
    pub fn reject_next(&self, status: u16, body: &str) -> &Self {
        self.creates.lock().unwrap().push_back(Err(ReplicateError::ApiError {
            status,
            body: body.to_string(),
        }));
        self
    }

    /// What `get_prediction` returns for this job from now on.
    pub fn set_prediction(&self, prediction: Prediction) {
        self.predictions
            .lock()
            .unwrap()
            .insert(prediction.id.clone(), prediction);
    }

    /// Every create sleeps this long before answering.
    pub fn set_create_delay(&self, delay: Duration) {
        *self.create_delay.lock().unwrap() = Some(delay);
    }

    /// Every create request received, in order.
    pub fn calls(&self) -> Vec<CreatePrediction> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationProvider for ScriptedProvider {
    async fn create_prediction(
        &self,
        input: &CreatePrediction,
    ) -> Result<Prediction, ReplicateError> {
        let n = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(input.clone());
            calls.len()
        };
        let delay = *self.create_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let scripted = self.creates.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| {
            Ok(prediction(
                &format!("job-{n}"),
                PredictionStatus::Starting,
                None,
            ))
        })
    }

    async fn get_prediction(&self, job_id: &str) -> Result<Prediction, ReplicateError> {
        self.predictions
            .lock()
            .unwrap()
            .get(job_id)
            .cloned()
            .ok_or_else(|| ReplicateError::ApiError {
                status: 404,
                body: format!("prediction {job_id} not found"),
            })
    }
}

// ---------------------------------------------------------------------------
// Artifacts
// ---------------------------------------------------------------------------

/// One recorded upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    pub key: String,
    pub content_type: String,
    pub size: usize,
}

#[derive(Default)]
pub struct MemoryArtifactStore {
    objects: Mutex<Vec<StoredArtifact>>,
    failing: AtomicBool,
}

impl MemoryArtifactStore {
    pub const BASE_URL: &'static str = "https://artifacts.test";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn objects(&self) -> Vec<StoredArtifact> {
        self.objects.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, ArtifactError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ArtifactError::Upload {
                key: key.to_string(),
                message: "bucket unreachable".into(),
            });
        }
        self.objects.lock().unwrap().push(StoredArtifact {
            key: key.to_string(),
            content_type: content_type.to_string(),
            size: bytes.len(),
        });
        Ok(inkforge_cloud::public_url(Self::BASE_URL, key))
    }
}
