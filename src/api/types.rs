//! Shared types used by the Debugattor HTTP client.

use reqwest::StatusCode;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Errors returned while interacting with the Debugattor API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid Debugattor URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The API responded with a non-success status code.
    #[error("Unexpected Debugattor response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the API.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// A successful response lacked a field the caller relies on.
    #[error("API response does not contain the '{0}' field")]
    MissingField(&'static str),
    /// A successful response did not match the expected shape.
    #[error("Failed to decode API response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Kinds of artifact accepted by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArtifactType {
    /// Uploaded image file.
    Image,
    /// Plain text log line.
    Log,
    /// JSON document.
    JsonData,
}

impl ArtifactType {
    /// Wire name of the artifact type.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "IMAGE",
            Self::Log => "LOG",
            Self::JsonData => "JSON_DATA",
        }
    }
}

/// Lifecycle state of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    /// Step registered and not yet finished.
    Running,
    /// Step completed successfully.
    Completed,
    /// Step marked as failed.
    Failed,
    /// Status this SDK does not know about.
    #[serde(other)]
    Unknown,
}

/// Execution as returned by the API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResponse {
    /// Server-issued execution identifier.
    pub id: String,
    /// RFC3339 start timestamp.
    #[serde(default)]
    pub started_at: Option<String>,
    /// RFC3339 finish timestamp, absent while running.
    #[serde(default)]
    pub finished_at: Option<String>,
    /// Steps registered so far.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub steps: Vec<StepResponse>,
}

/// Step as returned by the API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResponse {
    /// Server-issued step identifier.
    pub id: String,
    /// Human-readable step name.
    #[serde(default)]
    pub name: Option<String>,
    /// Current lifecycle state.
    #[serde(default)]
    pub status: Option<StepStatus>,
    /// Registration timestamp.
    #[serde(default)]
    pub registered_at: Option<String>,
    /// Completion timestamp.
    #[serde(default)]
    pub completed_at: Option<String>,
    /// Artifacts logged against the step.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub artifacts: Vec<ArtifactResponse>,
}

/// Artifact as returned by the API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactResponse {
    /// Server-issued artifact identifier.
    pub id: String,
    /// Wire name of the artifact type.
    #[serde(rename = "type", default)]
    pub artifact_type: Option<String>,
    /// Optional description supplied when logging.
    #[serde(default)]
    pub description: Option<String>,
    /// Inline content, or a storage reference for uploads.
    #[serde(default)]
    pub content: Option<String>,
    /// Logging timestamp.
    #[serde(default)]
    pub logged_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RegisterStepRequest<'a> {
    pub(crate) name: &'a str,
}

/// Body of an inline artifact log.
#[derive(Debug, Clone, Serialize)]
pub struct LogArtifactRequest<'a> {
    /// Wire name of the artifact type.
    #[serde(rename = "type")]
    pub artifact_type: &'a str,
    /// Artifact content.
    pub content: &'a str,
    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn execution_tolerates_null_steps() {
        let execution: ExecutionResponse = serde_json::from_value(json!({
            "id": "7a2554de-7c7f-42ea-a79a-4c57ff7146d6",
            "steps": null,
            "startedAt": "2025-09-28T01:45:19.78764-03:00",
            "finishedAt": null
        }))
        .expect("execution");
        assert!(execution.steps.is_empty());
        assert!(execution.finished_at.is_none());
    }

    #[test]
    fn step_status_parses_known_and_unknown_values() {
        let step: StepResponse = serde_json::from_value(json!({
            "id": "6699b347-7686-4a5f-9a4b-976f6e364e94",
            "name": "loading images",
            "status": "RUNNING",
            "artifacts": [{"id": "a1", "type": "LOG", "content": "hi"}],
            "registeredAt": "2025-09-28T05:05:32.103538Z",
            "completedAt": null
        }))
        .expect("step");
        assert_eq!(step.status, Some(StepStatus::Running));
        assert_eq!(step.artifacts[0].artifact_type.as_deref(), Some("LOG"));

        let status: StepStatus = serde_json::from_value(json!("PAUSED")).expect("status");
        assert_eq!(status, StepStatus::Unknown);
    }

    #[test]
    fn artifact_request_omits_missing_description() {
        let body = serde_json::to_value(LogArtifactRequest {
            artifact_type: ArtifactType::JsonData.as_str(),
            content: "{}",
            description: None,
        })
        .expect("serializes");
        assert_eq!(body, json!({"type": "JSON_DATA", "content": "{}"}));
    }
}
