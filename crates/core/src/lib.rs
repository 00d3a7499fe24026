//! Inkforge domain core.
//!
//! Pure domain logic shared by the pipeline and the API server: design
//! request status machine, wizard validation, prompt composition, inline
//! image decoding, provider webhook signature verification, and the
//! bounded status polling loop. Nothing in here performs network or
//! database I/O.

pub mod data_url;
pub mod design_request;
pub mod error;
pub mod polling;
pub mod prediction;
pub mod search;
pub mod types;
pub mod webhook_signature;
