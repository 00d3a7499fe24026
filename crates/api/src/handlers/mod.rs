//! Request handlers.
//!
//! Design request and generation handlers delegate to the pipeline
//! (`Orchestrator`, `CompletionReceiver`, `DesignRequestStore`); project
//! handlers go straight to the repositories in `inkforge_db`. Errors are
//! mapped via [`AppError`](crate::error::AppError).

pub mod design_request;
pub mod generation;
pub mod project;
pub mod project_design;
pub mod webhook;
