//! Shared response envelope types for API handlers.
//!
//! Resource endpoints use a `{ "data": ... }` envelope. The generation and
//! webhook endpoints keep the `{ "success": ... }` shape their callers
//! expect.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// `{ "success": bool }` acknowledgement returned to the provider.
#[derive(Debug, Serialize)]
pub struct Ack {
    pub success: bool,
}
