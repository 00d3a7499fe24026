//! HTTP client for the Replicate `/predictions` endpoints.
//!
//! Wraps prediction creation (with completion webhook) and prediction
//! retrieval using [`reqwest`].

use inkforge_core::prediction::{PredictionOutcome, PredictionStatus};
use serde::{Deserialize, Serialize};

/// Public Replicate API base URL.
pub const DEFAULT_API_URL: &str = "https://api.replicate.com/v1";

/// Model version used for tattoo generation.
pub const DEFAULT_MODEL_VERSION: &str =
    "39ed52f2a78e934b3ba6e2a89f5b1c712de7dfea535525255b1aa35c5565e08b";

/// Sampler passed to the model.
pub const SCHEDULER: &str = "K_EULER";

/// Denoising steps per image.
pub const NUM_INFERENCE_STEPS: u32 = 50;

/// One image per design request.
pub const NUM_OUTPUTS: u32 = 1;

/// Only the terminal webhook is requested; progress events are not needed.
pub const WEBHOOK_EVENTS: &[&str] = &["completed"];

/// Connection settings for the provider.
#[derive(Clone)]
pub struct ReplicateConfig {
    pub api_url: String,
    pub api_token: String,
    pub model_version: String,
}

impl std::fmt::Debug for ReplicateConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicateConfig")
            .field("api_url", &self.api_url)
            .field("api_token", &"<redacted>")
            .field("model_version", &self.model_version)
            .finish()
    }
}

/// Input for a new prediction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePrediction {
    pub prompt: String,
    pub negative_prompt: String,
    /// Image URL or inline data URL; omitted from the request when `None`.
    pub image: Option<String>,
    /// Completion callback address; omitted when no public address exists.
    pub webhook: Option<String>,
}

/// A prediction document as returned by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub id: String,
    pub status: PredictionStatus,
    #[serde(default)]
    pub output: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
    #[serde(default)]
    pub webhook: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Prediction {
    pub fn outcome(&self) -> PredictionOutcome {
        PredictionOutcome::from_parts(self.status, self.output.as_ref())
    }
}

/// Errors from the provider REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum ReplicateError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status code.
    #[error("Replicate API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

/// HTTP client for the prediction API.
pub struct ReplicateApi {
    client: reqwest::Client,
    config: ReplicateConfig,
}

impl ReplicateApi {
    pub fn new(config: ReplicateConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: ReplicateConfig) -> Self {
        Self { client, config }
    }

    /// Start a prediction. Returns as soon as the provider has queued it.
    pub async fn create_prediction(
        &self,
        input: &CreatePrediction,
    ) -> Result<Prediction, ReplicateError> {
        let body = prediction_body(input, &self.config.model_version);

        tracing::debug!(
            webhook = input.webhook.as_deref().unwrap_or("<none>"),
            has_image = input.image.is_some(),
            "Creating prediction"
        );

        let response = self
            .client
            .post(format!("{}/predictions", self.base_url()))
            .bearer_auth(&self.config.api_token)
            .json(&body)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Fetch the current state of a prediction.
    pub async fn get_prediction(&self, id: &str) -> Result<Prediction, ReplicateError> {
        let response = self
            .client
            .get(format!("{}/predictions/{}", self.base_url(), id))
            .bearer_auth(&self.config.api_token)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    fn base_url(&self) -> &str {
        self.config.api_url.trim_end_matches('/')
    }

    /// Ensure the response has a success status code, otherwise capture the
    /// status and body text as a [`ReplicateError::ApiError`].
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ReplicateError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ReplicateError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ReplicateError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

/// Build the JSON body for `POST /predictions`.
pub fn prediction_body(input: &CreatePrediction, model_version: &str) -> serde_json::Value {
    let mut model_input = serde_json::json!({
        "prompt": input.prompt,
        "negative_prompt": input.negative_prompt,
        "num_outputs": NUM_OUTPUTS,
        "scheduler": SCHEDULER,
        "num_inference_steps": NUM_INFERENCE_STEPS,
    });
    if let Some(image) = &input.image {
        model_input["image"] = serde_json::Value::String(image.clone());
    }

    let mut body = serde_json::json!({
        "version": model_version,
        "input": model_input,
    });
    if let Some(webhook) = &input.webhook {
        body["webhook"] = serde_json::Value::String(webhook.clone());
        body["webhook_events_filter"] = serde_json::json!(WEBHOOK_EVENTS);
    }
    body
}
