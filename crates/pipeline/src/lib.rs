//! Design request generation pipeline.
//!
//! - [`orchestrator::Orchestrator`] turns a wizard payload into a stored
//!   request and a running provider job.
//! - [`receiver::CompletionReceiver`] verifies and applies provider
//!   completion callbacks.
//! - [`sweeper::Sweeper`] reconciles requests whose callback never arrived.
//! - [`wait::wait_for_terminal`] is the bounded polling fallback.
//!
//! All collaborators are injected through the [`store::DesignRequestStore`],
//! [`provider::GenerationProvider`] and [`inkforge_cloud::ArtifactStore`]
//! traits.

pub mod error;
pub mod orchestrator;
pub mod provider;
pub mod receiver;
pub mod store;
pub mod sweeper;
pub mod wait;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use error::{CallbackError, PipelineError, StoreError};
pub use orchestrator::{Generation, Orchestrator};
pub use provider::GenerationProvider;
pub use receiver::{CallbackOutcome, CompletionReceiver};
pub use store::{DesignRequestStore, PgDesignRequestStore};
pub use sweeper::{SweepPolicy, SweepReport, Sweeper};
