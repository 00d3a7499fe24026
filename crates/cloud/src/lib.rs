//! Object storage for user-supplied images.
//!
//! The pipeline only depends on the [`ArtifactStore`] trait; production
//! wiring uses [`s3::S3ArtifactStore`] against any S3-compatible endpoint.

use async_trait::async_trait;

pub mod s3;

pub use s3::{S3ArtifactStore, S3Settings};

/// Prefix under which every uploaded object is stored.
pub const PUBLIC_PREFIX: &str = "public";

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Upload of {key} failed: {message}")]
    Upload { key: String, message: String },

    #[error("Artifact store misconfigured: {0}")]
    Config(String),
}

/// Write-only blob storage returning publicly reachable URLs.
#[async_trait]
pub trait ArtifactStore: Send + Sync + 'static {
    /// Store `bytes` under `key` and return the public URL of the object.
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, ArtifactError>;
}

/// Build a collision-free object key such as
/// `public/reference-1700000000000-3f2a9c1e.png`.
pub fn object_key(kind: &str, extension: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{PUBLIC_PREFIX}/{kind}-{millis}-{}.{extension}", &suffix[..8])
}

/// Join a public base URL and an object key with exactly one slash.
pub fn public_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key.trim_start_matches('/'))
}
