//! Design request entity model and DTOs.

use inkforge_core::design_request::DesignRequestStatus;
use inkforge_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `design_requests` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DesignRequest {
    pub id: DbId,
    pub style: String,
    pub body_placement: String,
    pub detail_level: String,
    pub modifier: String,
    pub negative_prompt: String,
    pub description: String,
    pub reference_image_url: Option<String>,
    pub freestyle_drawing_url: Option<String>,
    pub external_job_id: Option<String>,
    pub generated_image_url: Option<String>,
    #[sqlx(rename = "status_id", try_from = "i16")]
    pub status: DesignRequestStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a new design request. Rows always start `pending`.
#[derive(Debug, Clone)]
pub struct CreateDesignRequest {
    pub style: String,
    pub body_placement: String,
    pub detail_level: String,
    pub modifier: String,
    pub negative_prompt: String,
    pub description: String,
    pub reference_image_url: Option<String>,
    pub freestyle_drawing_url: Option<String>,
}

/// The fields a polling client needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DesignRequestStatusView {
    pub id: DbId,
    pub status: DesignRequestStatus,
    pub generated_image_url: Option<String>,
}

impl From<&DesignRequest> for DesignRequestStatusView {
    fn from(row: &DesignRequest) -> Self {
        Self {
            id: row.id,
            status: row.status,
            generated_image_url: row.generated_image_url.clone(),
        }
    }
}
