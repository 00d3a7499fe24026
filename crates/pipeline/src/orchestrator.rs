//! Request Orchestrator.
//!
//! Turns a validated wizard payload into a stored design request and a
//! running provider job. The submit flow is linear; the provider call is its
//! only suspension point outside the store. Once a row exists, every exit
//! path leaves it either `generating` with a job id or `failed`.
//!
//! The flow runs on its own task. A caller that stops waiting (client
//! disconnect, request timeout) does not stop the flow halfway.

use std::future::Future;
use std::sync::Arc;

use inkforge_cloud::{object_key, ArtifactStore};
use inkforge_core::data_url::decode_image;
use inkforge_core::design_request::{compose_prompt, DesignPayload, DesignRequestStatus};
use inkforge_core::types::DbId;
use inkforge_db::models::design_request::{CreateDesignRequest, DesignRequest};
use inkforge_replicate::{CreatePrediction, Prediction};

use crate::error::PipelineError;
use crate::provider::GenerationProvider;
use crate::store::DesignRequestStore;

/// A started generation: the updated record and the provider's job document.
#[derive(Debug, Clone)]
pub struct Generation {
    pub request: DesignRequest,
    pub prediction: Prediction,
}

#[derive(Clone)]
pub struct Orchestrator {
    store: Arc<dyn DesignRequestStore>,
    provider: Arc<dyn GenerationProvider>,
    artifacts: Arc<dyn ArtifactStore>,
    callback_url: Option<String>,
}

impl Orchestrator {
    /// `callback_url` is the fully resolved webhook address; `None` submits
    /// jobs without a webhook and leaves completion to the sweeper.
    pub fn new(
        store: Arc<dyn DesignRequestStore>,
        provider: Arc<dyn GenerationProvider>,
        artifacts: Arc<dyn ArtifactStore>,
        callback_url: Option<String>,
    ) -> Self {
        Self {
            store,
            provider,
            artifacts,
            callback_url,
        }
    }

    /// Validate the payload, upload inline images, and insert a `pending` row.
    ///
    /// Image failures are logged and the image is dropped. Store failures
    /// abort the operation.
    pub async fn create_request(
        &self,
        payload: &DesignPayload,
    ) -> Result<DesignRequest, PipelineError> {
        payload.validate()?;

        let reference_image_url = match payload.reference_image.as_deref() {
            Some(data) => self.upload_inline_image("reference", data).await,
            None => None,
        };
        let freestyle_drawing_url = match payload.freestyle_drawing.as_deref() {
            Some(data) => self.upload_inline_image("freestyle", data).await,
            None => None,
        };

        let input = CreateDesignRequest {
            style: payload.style.clone(),
            body_placement: payload.body_placement.clone(),
            detail_level: payload.detail_level.clone(),
            modifier: payload.modifier.clone(),
            negative_prompt: payload.negative_prompt.clone(),
            description: payload.description.clone(),
            reference_image_url,
            freestyle_drawing_url,
        };
        let request = self.store.create(&input).await?;

        tracing::info!(
            design_request_id = request.id,
            has_reference = request.reference_image_url.is_some(),
            has_freestyle = request.freestyle_drawing_url.is_some(),
            "Design request created"
        );
        Ok(request)
    }

    /// Move a `pending` request through `processing` to `generating`.
    ///
    /// The prompt is composed from `payload`. The image handed to the
    /// provider is the stored reference or freestyle URL, falling back to the
    /// payload's inline image when it decodes. If anything fails after the
    /// request left `pending`, the row is marked `failed` before the error is
    /// returned.
    pub async fn start_generation(
        &self,
        id: DbId,
        payload: &DesignPayload,
    ) -> Result<Generation, PipelineError> {
        let this = self.clone();
        let payload = payload.clone();
        detached(async move { this.generate(id, &payload).await }).await
    }

    /// Full submit flow: [`Self::create_request`] then [`Self::start_generation`].
    pub async fn submit(&self, payload: &DesignPayload) -> Result<Generation, PipelineError> {
        let this = self.clone();
        let payload = payload.clone();
        detached(async move {
            let request = this.create_request(&payload).await?;
            this.generate(request.id, &payload).await
        })
        .await
    }

    // ---- private helpers ----

    async fn generate(
        &self,
        id: DbId,
        payload: &DesignPayload,
    ) -> Result<Generation, PipelineError> {
        payload.validate()?;

        let Some(request) = self
            .store
            .transition(id, DesignRequestStatus::Processing)
            .await?
        else {
            return Err(self.rejected(id).await?);
        };

        match self.submit_job(&request, payload).await {
            Ok(generation) => Ok(generation),
            Err(err) => {
                self.compensate(id, &err).await;
                Err(err)
            }
        }
    }

    async fn submit_job(
        &self,
        request: &DesignRequest,
        payload: &DesignPayload,
    ) -> Result<Generation, PipelineError> {
        let image = request
            .reference_image_url
            .clone()
            .or_else(|| request.freestyle_drawing_url.clone())
            .or_else(|| payload.inline_image().map(str::to_string));

        let input = CreatePrediction {
            prompt: compose_prompt(payload.prompt_fields()),
            negative_prompt: payload.negative_prompt.clone(),
            image,
            webhook: self.callback_url.clone(),
        };

        let prediction = self
            .provider
            .create_prediction(&input)
            .await
            .map_err(|source| PipelineError::Provider {
                id: request.id,
                source,
            })?;

        let Some(updated) = self
            .store
            .record_submission(request.id, &prediction.id)
            .await?
        else {
            tracing::error!(
                design_request_id = request.id,
                job_id = %prediction.id,
                "Provider accepted the job but the request could not record it"
            );
            return Err(self.rejected(request.id).await?);
        };

        tracing::info!(
            design_request_id = updated.id,
            job_id = %prediction.id,
            webhook = self.callback_url.is_some(),
            "Generation started"
        );
        Ok(Generation {
            request: updated,
            prediction,
        })
    }

    /// Explain why a guarded write did not match.
    async fn rejected(&self, id: DbId) -> Result<PipelineError, PipelineError> {
        Ok(match self.store.find_by_id(id).await? {
            Some(row) => PipelineError::InvalidState {
                id,
                status: row.status,
            },
            None => PipelineError::NotFound(id),
        })
    }

    /// Compensating write. Only applies while no job id is recorded, so a
    /// job that did start is never stomped.
    async fn compensate(&self, id: DbId, cause: &PipelineError) {
        match self.store.fail_unsubmitted(id).await {
            Ok(Some(_)) => {
                tracing::error!(design_request_id = id, error = %cause, "Generation failed; request marked failed");
            }
            Ok(None) => {
                tracing::error!(design_request_id = id, error = %cause, "Generation failed; request already left the submit flow");
            }
            Err(e) => {
                tracing::error!(
                    design_request_id = id,
                    error = %cause,
                    compensation_error = %e,
                    "Generation failed and the request could not be marked failed"
                );
            }
        }
    }

    /// Decode and upload one inline image. Returns `None` on any failure.
    async fn upload_inline_image(&self, kind: &str, data_url: &str) -> Option<String> {
        if data_url.is_empty() {
            return None;
        }
        let image = match decode_image(data_url) {
            Ok(image) => image,
            Err(e) => {
                tracing::warn!(kind, error = %e, "Dropping undecodable inline image");
                return None;
            }
        };

        let key = object_key(kind, image.extension);
        match self
            .artifacts
            .put(&key, image.bytes, image.content_type)
            .await
        {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(kind, key = %key, error = %e, "Image upload failed; continuing without it");
                None
            }
        }
    }
}

/// Run `flow` on its own task and wait for it. Dropping the returned future
/// leaves the task running to completion.
async fn detached<F>(flow: F) -> Result<Generation, PipelineError>
where
    F: Future<Output = Result<Generation, PipelineError>> + Send + 'static,
{
    tokio::spawn(flow)
        .await
        .map_err(|e| PipelineError::Interrupted(e.to_string()))?
}
