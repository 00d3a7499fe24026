//! Generation provider seam.

use async_trait::async_trait;
use inkforge_replicate::{CreatePrediction, Prediction, ReplicateApi, ReplicateError};

#[async_trait]
pub trait GenerationProvider: Send + Sync + 'static {
    /// Submit a job. The returned prediction carries the job id.
    async fn create_prediction(&self, input: &CreatePrediction)
        -> Result<Prediction, ReplicateError>;

    /// Fetch the current state of a previously submitted job.
    async fn get_prediction(&self, job_id: &str) -> Result<Prediction, ReplicateError>;
}

#[async_trait]
impl GenerationProvider for ReplicateApi {
    async fn create_prediction(
        &self,
        input: &CreatePrediction,
    ) -> Result<Prediction, ReplicateError> {
        ReplicateApi::create_prediction(self, input).await
    }

    async fn get_prediction(&self, job_id: &str) -> Result<Prediction, ReplicateError> {
        ReplicateApi::get_prediction(self, job_id).await
    }
}
