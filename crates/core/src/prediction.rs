//! Generation provider job status and output interpretation.
//!
//! Both the webhook receiver and the background reconciler see the same
//! prediction document, either pushed by the provider or fetched on demand.
//! [`PredictionOutcome::from_parts`] is the single place that decides what a
//! given document means for the design request it belongs to.

use serde::{Deserialize, Serialize};

/// Provider-side job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    /// Any status value this service does not know about.
    #[serde(other)]
    Unknown,
}

impl PredictionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Canceled)
    }
}

/// Job status document as delivered in a provider callback.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PredictionPayload {
    pub id: String,
    pub status: PredictionStatus,
    #[serde(default)]
    pub output: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

/// What a prediction document means for the matching design request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredictionOutcome {
    /// Terminal success with a usable output reference.
    Succeeded { output_url: String },
    /// Terminal failure. `reason` is provider detail for the logs only.
    Failed { reason: String },
    /// Intermediate progress; nothing to persist.
    InProgress,
}

impl PredictionOutcome {
    pub fn from_parts(status: PredictionStatus, output: Option<&serde_json::Value>) -> Self {
        match status {
            PredictionStatus::Succeeded => match output.and_then(extract_output) {
                Some(output_url) => Self::Succeeded { output_url },
                None => Self::Failed {
                    reason: "prediction succeeded without an output reference".into(),
                },
            },
            PredictionStatus::Failed => Self::Failed {
                reason: "prediction failed".into(),
            },
            PredictionStatus::Canceled => Self::Failed {
                reason: "prediction canceled".into(),
            },
            PredictionStatus::Starting | PredictionStatus::Processing | PredictionStatus::Unknown => {
                Self::InProgress
            }
        }
    }
}

impl PredictionPayload {
    pub fn outcome(&self) -> PredictionOutcome {
        PredictionOutcome::from_parts(self.status, self.output.as_ref())
    }
}

/// Pull the canonical output reference out of a prediction `output` field.
///
/// The field holds either a single string or a list; for a list the first
/// non-empty string wins.
pub fn extract_output(output: &serde_json::Value) -> Option<String> {
    match output {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        serde_json::Value::Array(items) => items.first().and_then(extract_output),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_output_takes_first_element() {
        let out = json!(["https://cdn/img.png", "https://cdn/other.png"]);
        assert_eq!(extract_output(&out).as_deref(), Some("https://cdn/img.png"));
    }

    #[test]
    fn string_output_is_used_directly() {
        assert_eq!(
            extract_output(&json!("https://cdn/single.webp")).as_deref(),
            Some("https://cdn/single.webp")
        );
    }

    #[test]
    fn empty_or_non_string_output_yields_nothing() {
        assert_eq!(extract_output(&json!([])), None);
        assert_eq!(extract_output(&json!("")), None);
        assert_eq!(extract_output(&json!({"url": "x"})), None);
        assert_eq!(extract_output(&json!(null)), None);
    }

    #[test]
    fn callback_payload_parses_provider_document() {
        let p: PredictionPayload = serde_json::from_value(json!({
            "id": "abc123",
            "status": "succeeded",
            "output": ["https://cdn/img.png"],
            "metrics": {"predict_time": 4.2}
        }))
        .unwrap();
        assert_eq!(p.id, "abc123");
        assert_eq!(
            p.outcome(),
            PredictionOutcome::Succeeded {
                output_url: "https://cdn/img.png".into()
            }
        );
    }

    #[test]
    fn unknown_status_is_in_progress() {
        let p: PredictionPayload =
            serde_json::from_value(json!({"id": "x", "status": "queued"})).unwrap();
        assert_eq!(p.status, PredictionStatus::Unknown);
        assert_eq!(p.outcome(), PredictionOutcome::InProgress);
    }

    #[test]
    fn canceled_counts_as_failure() {
        assert!(matches!(
            PredictionOutcome::from_parts(PredictionStatus::Canceled, None),
            PredictionOutcome::Failed { .. }
        ));
    }

    #[test]
    fn success_without_output_is_a_failure() {
        assert!(matches!(
            PredictionOutcome::from_parts(PredictionStatus::Succeeded, Some(&json!([]))),
            PredictionOutcome::Failed { .. }
        ));
    }

    #[test]
    fn terminal_statuses() {
        assert!(PredictionStatus::Succeeded.is_terminal());
        assert!(PredictionStatus::Canceled.is_terminal());
        assert!(!PredictionStatus::Processing.is_terminal());
    }
}
