//! REST client for the Replicate prediction API.
//!
//! The generation provider runs one asynchronous prediction per design
//! request. This crate only knows how to create and fetch predictions; the
//! lifecycle around them lives in `inkforge-pipeline`.

pub mod api;

pub use api::{CreatePrediction, Prediction, ReplicateApi, ReplicateConfig, ReplicateError};
