use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use inkforge_core::design_request::DesignPayload;
use inkforge_core::webhook_signature::{SignatureVerifier, WebhookSecret};
use inkforge_pipeline::testing::{MemoryArtifactStore, MemoryStore, ScriptedProvider};
use inkforge_pipeline::{CompletionReceiver, Orchestrator, SweepPolicy, Sweeper};

pub const CALLBACK_URL: &str = "https://hooks.example.com/api/v1/webhooks/replicate";

pub const PNG_1X1: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

pub fn png_data_url() -> String {
    format!("data:image/png;base64,{PNG_1X1}")
}

pub fn payload() -> DesignPayload {
    DesignPayload {
        style: "Blackwork".into(),
        body_placement: "forearm".into(),
        detail_level: "high".into(),
        modifier: "symmetrical".into(),
        negative_prompt: "blurry".into(),
        description: "a wolf howling".into(),
        reference_image: None,
        freestyle_drawing: None,
    }
}

pub fn secret() -> WebhookSecret {
    WebhookSecret::parse(&format!("whsec_{}", BASE64.encode(b"pipeline-test-key"))).unwrap()
}

/// Signature and timestamp headers for `body`, signed now.
pub fn signed_headers(body: &str) -> (String, String) {
    let ts = chrono::Utc::now().timestamp().to_string();
    (format!("v1,{}", secret().sign(&ts, body)), ts)
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub provider: Arc<ScriptedProvider>,
    pub artifacts: Arc<MemoryArtifactStore>,
    pub orchestrator: Orchestrator,
    pub receiver: CompletionReceiver,
}

impl Harness {
    /// Orchestrator with a callback URL and a receiver enforcing signatures.
    pub fn new() -> Self {
        Self::with_verifier(SignatureVerifier::new(Some(secret()), Some(300)))
    }

    pub fn with_verifier(verifier: SignatureVerifier) -> Self {
        let store = Arc::new(MemoryStore::new());
        let provider = Arc::new(ScriptedProvider::new());
        let artifacts = Arc::new(MemoryArtifactStore::new());
        let orchestrator = Orchestrator::new(
            store.clone(),
            provider.clone(),
            artifacts.clone(),
            Some(CALLBACK_URL.to_string()),
        );
        let receiver = CompletionReceiver::new(store.clone(), verifier);
        Self {
            store,
            provider,
            artifacts,
            orchestrator,
            receiver,
        }
    }

    pub fn sweeper(&self, policy: SweepPolicy) -> Sweeper {
        Sweeper::new(self.store.clone(), self.provider.clone(), policy)
    }

    /// Deliver a correctly signed callback.
    pub async fn deliver(
        &self,
        body: &str,
    ) -> Result<inkforge_pipeline::CallbackOutcome, inkforge_pipeline::CallbackError> {
        let (sig, ts) = signed_headers(body);
        self.receiver
            .handle_callback(body, Some(&sig), Some(&ts))
            .await
    }
}
