//! S3-compatible [`ArtifactStore`] backed by `aws-sdk-s3`.

use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;

use crate::{public_url, ArtifactError, ArtifactStore};

/// Uploaded images never change once written.
const CACHE_CONTROL: &str = "public, max-age=3600";

/// Connection settings for the bucket.
#[derive(Clone)]
pub struct S3Settings {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for non-AWS providers (MinIO, R2, Supabase storage).
    pub endpoint_url: Option<String>,
    /// Prefix prepended to object keys to form the returned URL.
    pub public_base_url: String,
    /// Static credentials; the default provider chain is used when absent.
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

impl std::fmt::Debug for S3Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Settings")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint_url", &self.endpoint_url)
            .field("public_base_url", &self.public_base_url)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

pub struct S3ArtifactStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_base_url: String,
}

impl S3ArtifactStore {
    /// Build a client from `settings`, loading ambient AWS configuration for
    /// anything not set explicitly.
    pub async fn connect(settings: S3Settings) -> Result<Self, ArtifactError> {
        if settings.bucket.trim().is_empty() {
            return Err(ArtifactError::Config("bucket name is empty".into()));
        }

        let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared).force_path_style(true);
        if let Some(endpoint) = &settings.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }
        match (&settings.access_key_id, &settings.secret_access_key) {
            (Some(key_id), Some(secret)) => {
                builder = builder.credentials_provider(Credentials::new(
                    key_id,
                    secret,
                    None,
                    None,
                    "inkforge-static",
                ));
            }
            (None, None) => {}
            _ => {
                return Err(ArtifactError::Config(
                    "access key id and secret access key must be set together".into(),
                ))
            }
        }

        tracing::info!(
            bucket = %settings.bucket,
            endpoint = settings.endpoint_url.as_deref().unwrap_or("<aws>"),
            "Artifact store configured"
        );

        Ok(Self {
            client: aws_sdk_s3::Client::from_conf(builder.build()),
            bucket: settings.bucket,
            public_base_url: settings.public_base_url,
        })
    }
}

#[async_trait]
impl ArtifactStore for S3ArtifactStore {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, ArtifactError> {
        let size = bytes.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .cache_control(CACHE_CONTROL)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| ArtifactError::Upload {
                key: key.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        tracing::debug!(bucket = %self.bucket, key, size, "Uploaded artifact");
        Ok(public_url(&self.public_base_url, key))
    }
}
