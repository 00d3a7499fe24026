//! Saved project design model and DTOs.

use inkforge_core::design_request::DesignRequestStatus;
use inkforge_core::error::CoreError;
use inkforge_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::design_request::DesignRequest;

/// A row from the `project_designs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProjectDesign {
    pub id: DbId,
    pub project_id: DbId,
    pub design_request_id: Option<DbId>,
    pub image_url: String,
    pub style: String,
    pub body_placement: String,
    pub detail_level: String,
    pub modifier: String,
    pub negative_prompt: String,
    pub description: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for saving a design into a project.
///
/// When `design_request_id` is given and the other fields are omitted, the
/// handler copies image URL and parameters from the completed request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateProjectDesign {
    pub design_request_id: Option<DbId>,
    pub image_url: Option<String>,
    pub style: Option<String>,
    pub body_placement: Option<String>,
    pub detail_level: Option<String>,
    pub modifier: Option<String>,
    pub negative_prompt: Option<String>,
    pub description: Option<String>,
}

/// Fully resolved insert values for a project design.
#[derive(Debug, Clone)]
pub struct NewProjectDesign {
    pub project_id: DbId,
    pub design_request_id: Option<DbId>,
    pub image_url: String,
    pub style: String,
    pub body_placement: String,
    pub detail_level: String,
    pub modifier: String,
    pub negative_prompt: String,
    pub description: String,
}

impl CreateProjectDesign {
    /// Fill in missing fields from `source` (the referenced design request)
    /// and check that the result is complete.
    ///
    /// A referenced request must be `completed`. Explicit fields always win
    /// over the copied ones.
    pub fn resolve(
        self,
        project_id: DbId,
        source: Option<&DesignRequest>,
    ) -> Result<NewProjectDesign, CoreError> {
        if let Some(request) = source {
            if request.status != DesignRequestStatus::Completed {
                return Err(CoreError::Conflict(format!(
                    "Design request {} is {}, only completed designs can be saved",
                    request.id, request.status
                )));
            }
        }

        let pick = |explicit: Option<String>, copied: Option<&String>| {
            explicit
                .filter(|v| !v.trim().is_empty())
                .or_else(|| copied.cloned())
        };

        let image_url = pick(
            self.image_url,
            source.and_then(|r| r.generated_image_url.as_ref()),
        )
        .ok_or_else(|| CoreError::Validation("image_url is required".into()))?;

        let required = |name: &str, value: Option<String>| {
            value.ok_or_else(|| CoreError::Validation(format!("{name} is required")))
        };

        Ok(NewProjectDesign {
            project_id,
            design_request_id: source.map(|r| r.id),
            image_url,
            style: required("style", pick(self.style, source.map(|r| &r.style)))?,
            body_placement: required(
                "body_placement",
                pick(self.body_placement, source.map(|r| &r.body_placement)),
            )?,
            detail_level: required(
                "detail_level",
                pick(self.detail_level, source.map(|r| &r.detail_level)),
            )?,
            modifier: required("modifier", pick(self.modifier, source.map(|r| &r.modifier)))?,
            negative_prompt: pick(self.negative_prompt, source.map(|r| &r.negative_prompt))
                .unwrap_or_default(),
            description: required(
                "description",
                pick(self.description, source.map(|r| &r.description)),
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn completed_request() -> DesignRequest {
        DesignRequest {
            id: 9,
            style: "Blackwork".into(),
            body_placement: "forearm".into(),
            detail_level: "high".into(),
            modifier: "symmetrical".into(),
            negative_prompt: "blurry".into(),
            description: "a wolf howling".into(),
            reference_image_url: None,
            freestyle_drawing_url: None,
            external_job_id: Some("abc123".into()),
            generated_image_url: Some("https://cdn/img.png".into()),
            status: DesignRequestStatus::Completed,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn copies_everything_from_completed_request() {
        let request = completed_request();
        let design = CreateProjectDesign {
            design_request_id: Some(9),
            ..Default::default()
        }
        .resolve(3, Some(&request))
        .unwrap();

        assert_eq!(design.project_id, 3);
        assert_eq!(design.design_request_id, Some(9));
        assert_eq!(design.image_url, "https://cdn/img.png");
        assert_eq!(design.style, "Blackwork");
        assert_eq!(design.negative_prompt, "blurry");
    }

    #[test]
    fn explicit_fields_win() {
        let request = completed_request();
        let design = CreateProjectDesign {
            design_request_id: Some(9),
            description: Some("a wolf at dusk".into()),
            ..Default::default()
        }
        .resolve(3, Some(&request))
        .unwrap();

        assert_eq!(design.description, "a wolf at dusk");
    }

    #[test]
    fn unfinished_request_cannot_be_saved() {
        let mut request = completed_request();
        request.status = DesignRequestStatus::Generating;
        request.generated_image_url = None;

        let err = CreateProjectDesign::default()
            .resolve(3, Some(&request))
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[test]
    fn standalone_design_needs_all_fields() {
        let err = CreateProjectDesign {
            image_url: Some("https://cdn/img.png".into()),
            style: Some("Dotwork".into()),
            ..Default::default()
        }
        .resolve(3, None)
        .unwrap_err();
        assert!(matches!(err, CoreError::Validation(msg) if msg == "body_placement is required"));
    }

    #[test]
    fn standalone_design_without_image_is_rejected() {
        let err = CreateProjectDesign::default().resolve(3, None).unwrap_err();
        assert!(matches!(err, CoreError::Validation(msg) if msg == "image_url is required"));
    }
}
