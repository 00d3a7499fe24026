use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use inkforge_cloud::s3::S3ArtifactStore;
use inkforge_core::webhook_signature::SignatureVerifier;
use inkforge_pipeline::{CompletionReceiver, Orchestrator, PgDesignRequestStore, Sweeper};
use inkforge_replicate::ReplicateApi;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use inkforge_api::config::ServerConfig;
use inkforge_api::router::build_app_router;
use inkforge_api::state::AppState;

/// Timeout for a single call to the generation provider. Shorter than the
/// default request timeout so a slow provider surfaces as a provider error.
const PROVIDER_TIMEOUT: Duration = Duration::from_secs(20);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    init_tracing();

    // --- Configuration ---
    let config = ServerConfig::from_env().context("Invalid server configuration")?;
    tracing::info!(
        host = %config.host,
        port = config.port,
        environment = ?config.environment,
        callback_url = config.callback_url.as_deref().unwrap_or("<none>"),
        "Loaded server configuration",
    );
    if config.callback_url.is_none() {
        tracing::warn!("No public callback URL; completions rely on the sweeper");
    }

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = inkforge_db::create_pool(&database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection pool created");

    inkforge_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    tracing::info!("Database health check passed");

    inkforge_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    // --- Collaborators ---
    let artifacts = S3ArtifactStore::connect(config.artifacts.clone())
        .await
        .context("Failed to configure artifact storage")?;

    let http = reqwest::Client::builder()
        .timeout(PROVIDER_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")?;
    let provider = Arc::new(ReplicateApi::with_client(http, config.replicate.clone()));

    let store = Arc::new(PgDesignRequestStore::new(pool.clone()));
    let verifier = SignatureVerifier::new(
        config.webhook_secret.clone(),
        Some(config.webhook_tolerance_secs),
    );

    let orchestrator = Arc::new(Orchestrator::new(
        store.clone(),
        provider.clone(),
        Arc::new(artifacts),
        config.callback_url.clone(),
    ));
    let receiver = Arc::new(CompletionReceiver::new(store.clone(), verifier));

    // --- Sweeper ---
    let sweep_cancel = CancellationToken::new();
    let sweeper = Sweeper::new(store.clone(), provider, config.sweep);
    let sweep_handle = tokio::spawn(sweeper.run(sweep_cancel.clone()));

    // --- App state ---
    let config = Arc::new(config);
    let state = AppState {
        pool,
        config: Arc::clone(&config),
        store,
        orchestrator,
        receiver,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let host = config
        .host
        .parse()
        .with_context(|| format!("Invalid HOST address '{}'", config.host))?;
    let addr = SocketAddr::new(host, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    sweep_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), sweep_handle).await;
    tracing::info!("Sweeper stopped");

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Install the global subscriber. `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "inkforge_api=debug,inkforge_pipeline=debug,tower_http=debug".into()
    });

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let fmt_layer = if json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
