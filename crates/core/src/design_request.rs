//! Design request lifecycle, wizard payload validation, and prompt
//! composition.
//!
//! The status machine is strictly forward-only:
//!
//! ```text
//! pending -> processing -> generating -> completed
//!    |           |             |
//!    +-----------+-------------+------> failed
//! ```
//!
//! `completed` and `failed` are terminal. Persistence layers enforce the
//! machine by guarding every status write with [`DesignRequestStatus::predecessors`].

use serde::{Deserialize, Serialize};

use crate::data_url::decode_image;
use crate::error::{CoreError, FieldError};

/// Status ID type matching the SMALLINT `status_id` column.
pub type StatusId = i16;

// ---------------------------------------------------------------------------
// Status machine
// ---------------------------------------------------------------------------

/// Lifecycle status of a design request.
///
/// Discriminants match the seed order of the `design_request_statuses`
/// lookup table.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesignRequestStatus {
    Pending = 1,
    Processing = 2,
    Generating = 3,
    Completed = 4,
    Failed = 5,
}

impl DesignRequestStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Generating,
        Self::Completed,
        Self::Failed,
    ];

    /// Return the database status ID.
    pub fn id(self) -> StatusId {
        self as StatusId
    }

    /// Map a database status ID back to a status.
    pub fn from_id(id: StatusId) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|s| s.id() == id)
            .ok_or_else(|| CoreError::Internal(format!("Unknown design request status id {id}")))
    }

    /// Wire name exposed to clients.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Generating => "generating",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// `completed` and `failed` accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Statuses from which a row may move into `self`.
    pub fn predecessors(self) -> &'static [Self] {
        match self {
            Self::Pending => &[],
            Self::Processing => &[Self::Pending],
            Self::Generating => &[Self::Processing],
            Self::Completed => &[Self::Generating],
            Self::Failed => &[Self::Pending, Self::Processing, Self::Generating],
        }
    }

    /// Database IDs of [`Self::predecessors`], ready to bind as `SMALLINT[]`.
    pub fn predecessor_ids(self) -> Vec<StatusId> {
        self.predecessors().iter().map(|s| s.id()).collect()
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        next.predecessors().contains(&self)
    }
}

impl std::fmt::Display for DesignRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<DesignRequestStatus> for StatusId {
    fn from(value: DesignRequestStatus) -> Self {
        value as StatusId
    }
}

impl TryFrom<StatusId> for DesignRequestStatus {
    type Error = CoreError;

    fn try_from(id: StatusId) -> Result<Self, Self::Error> {
        Self::from_id(id)
    }
}

// ---------------------------------------------------------------------------
// Wizard payload
// ---------------------------------------------------------------------------

/// Structured wizard payload as submitted by the client.
///
/// Required text fields default to empty so that a missing field surfaces
/// as a per-field validation message instead of a deserialization failure.
/// Images arrive as inline `data:` URLs.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignPayload {
    #[serde(default)]
    pub style: String,
    #[serde(default)]
    pub body_placement: String,
    #[serde(default)]
    pub detail_level: String,
    #[serde(default)]
    pub modifier: String,
    #[serde(default)]
    pub negative_prompt: String,
    #[serde(default)]
    pub description: String,
    pub reference_image: Option<String>,
    pub freestyle_drawing: Option<String>,
}

impl DesignPayload {
    /// Check required fields, collecting one message per missing field.
    pub fn validate(&self) -> Result<(), CoreError> {
        let required: [(&'static str, &str, &'static str); 5] = [
            (
                "description",
                self.description.as_str(),
                "Please enter a design description",
            ),
            ("style", self.style.as_str(), "Please select a style"),
            (
                "bodyPlacement",
                self.body_placement.as_str(),
                "Please select a body placement",
            ),
            (
                "detailLevel",
                self.detail_level.as_str(),
                "Please select a detail level",
            ),
            ("modifier", self.modifier.as_str(), "Please select a modifier"),
        ];

        let errors: Vec<FieldError> = required
            .into_iter()
            .filter(|(_, value, _)| value.trim().is_empty())
            .map(|(field, _, message)| FieldError { field, message })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(CoreError::InvalidFields(errors))
        }
    }

    pub fn prompt_fields(&self) -> PromptFields<'_> {
        PromptFields {
            style: &self.style,
            body_placement: &self.body_placement,
            detail_level: &self.detail_level,
            modifier: &self.modifier,
            description: &self.description,
        }
    }

    /// Inline image handed to the provider when nothing was uploaded.
    /// Only images that decode qualify; the reference image wins over the
    /// freestyle drawing.
    pub fn inline_image(&self) -> Option<&str> {
        [self.reference_image.as_deref(), self.freestyle_drawing.as_deref()]
            .into_iter()
            .flatten()
            .find(|data| decode_image(data).is_ok())
    }
}

// ---------------------------------------------------------------------------
// Prompt composition
// ---------------------------------------------------------------------------

/// The five structured fields that feed the generation prompt.
#[derive(Debug, Clone, Copy)]
pub struct PromptFields<'a> {
    pub style: &'a str,
    pub body_placement: &'a str,
    pub detail_level: &'a str,
    pub modifier: &'a str,
    pub description: &'a str,
}

/// Compose the natural-language prompt sent to the provider.
///
/// Fields are interpolated verbatim, without trimming or escaping.
pub fn compose_prompt(fields: PromptFields<'_>) -> String {
    format!(
        "Create a {style} tattoo design for {placement} with {detail} detail level. \
         Style should be {modifier}. The design should be: {description}",
        style = fields.style,
        placement = fields.body_placement,
        detail = fields.detail_level,
        modifier = fields.modifier,
        description = fields.description,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
