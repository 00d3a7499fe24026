use std::time::Duration;

use inkforge_cloud::S3Settings;
use inkforge_core::polling::PollPolicy;
use inkforge_core::webhook_signature::{WebhookSecret, DEFAULT_TOLERANCE_SECS};
use inkforge_pipeline::SweepPolicy;
use inkforge_replicate::api::{DEFAULT_API_URL, DEFAULT_MODEL_VERSION};
use inkforge_replicate::ReplicateConfig;

/// Path the provider posts completion callbacks to.
pub const WEBHOOK_PATH: &str = "/api/v1/webhooks/replicate";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Deployment environment, from `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Production,
}

impl AppEnvironment {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }
}

/// Server configuration loaded once at startup.
///
/// Every value the request path needs is resolved here, including the
/// provider callback URL, so nothing is derived from request headers.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Maximum request body size; inline images make payloads large.
    pub max_body_bytes: usize,
    pub environment: AppEnvironment,
    /// Fully resolved webhook URL, or `None` when no public address exists.
    pub callback_url: Option<String>,
    pub replicate: ReplicateConfig,
    /// `None` runs the webhook receiver without signature checks.
    pub webhook_secret: Option<WebhookSecret>,
    pub webhook_tolerance_secs: i64,
    pub artifacts: S3Settings,
    pub sweep: SweepPolicy,
    /// Interval between store reads on the long-poll endpoint.
    pub wait_interval: Duration,
    /// Upper bound for a single long-poll request.
    pub max_wait: Duration,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                    | Default                        |
    /// |----------------------------|--------------------------------|
    /// | `HOST`                     | `0.0.0.0`                      |
    /// | `PORT`                     | `3000`                         |
    /// | `CORS_ORIGINS`             | `http://localhost:3000`        |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                           |
    /// | `MAX_BODY_BYTES`           | `16777216`                     |
    /// | `APP_ENV`                  | `development`                  |
    /// | `PUBLIC_BASE_URL`          | unset                          |
    /// | `DEV_TUNNEL_URL`           | unset (ignored in production)  |
    /// | `REPLICATE_API_TOKEN`      | required                       |
    /// | `REPLICATE_API_URL`        | `https://api.replicate.com/v1` |
    /// | `REPLICATE_MODEL_VERSION`  | tattoo model version           |
    /// | `REPLICATE_WEBHOOK_SECRET` | unset                          |
    /// | `WEBHOOK_TOLERANCE_SECS`   | `300`                          |
    /// | `ARTIFACT_BUCKET`          | `user-images`                  |
    /// | `ARTIFACT_REGION`          | `us-east-1`                    |
    /// | `ARTIFACT_ENDPOINT_URL`    | unset                          |
    /// | `ARTIFACT_PUBLIC_BASE_URL` | required                       |
    /// | `ARTIFACT_ACCESS_KEY_ID`   | unset                          |
    /// | `ARTIFACT_SECRET_ACCESS_KEY` | unset                        |
    /// | `SWEEP_INTERVAL_SECS`      | `60`                           |
    /// | `RECONCILE_AFTER_SECS`     | `120`                          |
    /// | `GENERATION_TIMEOUT_SECS`  | `1800`                         |
    /// | `WAIT_POLL_INTERVAL_MS`    | `1000`                         |
    /// | `MAX_WAIT_SECS`            | `25`                           |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`Self::from_env`] with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = parse_or(&var, "PORT", 3000)?;

        let cors_origins: Vec<String> = var("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = parse_or(&var, "REQUEST_TIMEOUT_SECS", 30)?;
        let max_body_bytes: usize = parse_or(&var, "MAX_BODY_BYTES", 16 * 1024 * 1024)?;

        let environment =
            AppEnvironment::parse(&var("APP_ENV").unwrap_or_else(|| "development".into()));
        let callback_url = resolve_callback_url(
            environment,
            var("PUBLIC_BASE_URL").as_deref(),
            var("DEV_TUNNEL_URL").as_deref(),
        );

        let replicate = ReplicateConfig {
            api_url: var("REPLICATE_API_URL").unwrap_or_else(|| DEFAULT_API_URL.into()),
            api_token: var("REPLICATE_API_TOKEN")
                .ok_or(ConfigError::Missing("REPLICATE_API_TOKEN"))?,
            model_version: var("REPLICATE_MODEL_VERSION")
                .unwrap_or_else(|| DEFAULT_MODEL_VERSION.into()),
        };

        let webhook_secret = var("REPLICATE_WEBHOOK_SECRET")
            .map(|raw| {
                WebhookSecret::parse(&raw).map_err(|e| ConfigError::Invalid {
                    name: "REPLICATE_WEBHOOK_SECRET",
                    reason: e.to_string(),
                })
            })
            .transpose()?;
        let webhook_tolerance_secs: i64 =
            parse_or(&var, "WEBHOOK_TOLERANCE_SECS", DEFAULT_TOLERANCE_SECS)?;

        let artifacts = S3Settings {
            bucket: var("ARTIFACT_BUCKET").unwrap_or_else(|| "user-images".into()),
            region: var("ARTIFACT_REGION").unwrap_or_else(|| "us-east-1".into()),
            endpoint_url: var("ARTIFACT_ENDPOINT_URL"),
            public_base_url: var("ARTIFACT_PUBLIC_BASE_URL")
                .ok_or(ConfigError::Missing("ARTIFACT_PUBLIC_BASE_URL"))?,
            access_key_id: var("ARTIFACT_ACCESS_KEY_ID"),
            secret_access_key: var("ARTIFACT_SECRET_ACCESS_KEY"),
        };

        let defaults = SweepPolicy::default();
        let sweep = SweepPolicy {
            interval: Duration::from_secs(parse_or(
                &var,
                "SWEEP_INTERVAL_SECS",
                defaults.interval.as_secs(),
            )?),
            reconcile_after: Duration::from_secs(parse_or(
                &var,
                "RECONCILE_AFTER_SECS",
                defaults.reconcile_after.as_secs(),
            )?),
            generation_timeout: Duration::from_secs(parse_or(
                &var,
                "GENERATION_TIMEOUT_SECS",
                defaults.generation_timeout.as_secs(),
            )?),
            batch_size: defaults.batch_size,
        };
        if sweep.interval.is_zero() {
            return Err(ConfigError::Invalid {
                name: "SWEEP_INTERVAL_SECS",
                reason: "must be greater than zero".into(),
            });
        }

        let wait_interval = Duration::from_millis(parse_or(&var, "WAIT_POLL_INTERVAL_MS", 1000)?);
        let max_wait = Duration::from_secs(parse_or(&var, "MAX_WAIT_SECS", 25)?);

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            max_body_bytes,
            environment,
            callback_url,
            replicate,
            webhook_secret,
            webhook_tolerance_secs,
            artifacts,
            sweep,
            wait_interval,
            max_wait,
        })
    }

    /// Polling policy for one long-poll request of at most `requested`.
    pub fn wait_policy(&self, requested: Option<Duration>) -> PollPolicy {
        let budget = requested.map_or(self.max_wait, |r| r.min(self.max_wait));
        PollPolicy::within(self.wait_interval, budget)
    }
}

/// Pick the public base address the provider can reach and append the
/// webhook path.
///
/// Outside production a development tunnel overrides the public base URL.
/// Returns `None` when neither is configured; jobs are then submitted
/// without a webhook.
pub fn resolve_callback_url(
    environment: AppEnvironment,
    public_base_url: Option<&str>,
    dev_tunnel_url: Option<&str>,
) -> Option<String> {
    let tunnel = match environment {
        AppEnvironment::Development => dev_tunnel_url,
        AppEnvironment::Production => None,
    };
    tunnel
        .or(public_base_url)
        .map(|base| format!("{}{WEBHOOK_PATH}", base.trim_end_matches('/')))
}

fn parse_or<T>(
    var: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match var(name) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
