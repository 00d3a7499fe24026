use std::sync::Arc;

use inkforge_pipeline::{CompletionReceiver, DesignRequestStore, Orchestrator};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool (projects, saved designs, health).
    pub pool: inkforge_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Design request store shared with the orchestrator and receiver.
    pub store: Arc<dyn DesignRequestStore>,
    pub orchestrator: Arc<Orchestrator>,
    pub receiver: Arc<CompletionReceiver>,
}
