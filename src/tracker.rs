//! Report-tier operations for recording executions, steps, and artifacts.
//!
//! Every method here returns `Option` or `bool` instead of an error. Failures are logged and
//! the call reports them to the caller, but nothing panics or propagates, so a broken debug
//! server never alters the behavior of the pipeline being traced. Callers that want the
//! underlying error, for example to apply a retry policy, can use [`Tracker::client`].

use crate::api::{ApiClient, ApiError, ArtifactType, ExecutionResponse, LogArtifactRequest};
use crate::imaging::{ImageInput, process_image_input};
use crate::normalize::{Loggable, Normalizer};

/// Records executions, steps, and artifacts against a Debugattor server.
#[derive(Debug, Clone)]
pub struct Tracker {
    api: ApiClient,
    normalizer: Normalizer,
}

impl Tracker {
    /// Build a tracker from the process configuration.
    pub fn new() -> Result<Self, ApiError> {
        Ok(Self::with_client(ApiClient::from_config()?))
    }

    /// Build a tracker around an existing client.
    pub fn with_client(api: ApiClient) -> Self {
        Self {
            api,
            normalizer: Normalizer::default(),
        }
    }

    /// Replace the normalizer used for JSON artifacts.
    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Underlying client whose methods propagate errors.
    pub fn client(&self) -> &ApiClient {
        &self.api
    }

    /// Start a new execution and return its identifier.
    pub async fn start_execution(&self) -> Option<String> {
        match self.api.start_execution().await {
            Ok(execution) => {
                tracing::info!(execution_id = %execution.id, "Execution started");
                Some(execution.id)
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to start execution");
                None
            }
        }
    }

    /// Register a named step and return its identifier.
    pub async fn add_step(&self, execution_id: &str, step_name: &str) -> Option<String> {
        if !require("execution_id", execution_id) || !require("step_name", step_name) {
            return None;
        }

        match self.api.register_step(execution_id, step_name).await {
            Ok(step) => {
                tracing::info!(step_id = %step.id, step_name, "Step created");
                Some(step.id)
            }
            Err(err) => {
                tracing::error!(error = %err, execution_id, step_name, "Failed to add step");
                None
            }
        }
    }

    /// Mark a step as completed.
    pub async fn complete_step(&self, execution_id: &str, step_id: &str) -> bool {
        if !require("execution_id", execution_id) || !require("step_id", step_id) {
            return false;
        }
        report(
            self.api.complete_step(execution_id, step_id).await,
            "Failed to complete step",
            || tracing::info!(step_id, "Step marked as complete"),
        )
    }

    /// Mark a step as failed.
    pub async fn fail_step(&self, execution_id: &str, step_id: &str) -> bool {
        if !require("execution_id", execution_id) || !require("step_id", step_id) {
            return false;
        }
        report(
            self.api.fail_step(execution_id, step_id).await,
            "Failed to mark step as failed",
            || tracing::info!(step_id, "Step marked as failed"),
        )
    }

    /// Mark an execution as completed.
    pub async fn complete_execution(&self, execution_id: &str) -> bool {
        if !require("execution_id", execution_id) {
            return false;
        }
        report(
            self.api.complete_execution(execution_id).await,
            "Failed to complete execution",
            || tracing::info!(execution_id, "Execution marked as complete"),
        )
    }

    /// Mark an execution as failed.
    pub async fn fail_execution(&self, execution_id: &str) -> bool {
        if !require("execution_id", execution_id) {
            return false;
        }
        report(
            self.api.fail_execution(execution_id).await,
            "Failed to mark execution as failed",
            || tracing::info!(execution_id, "Execution marked as failed"),
        )
    }

    /// Log an artifact of any type with string content.
    pub async fn log_artifact(
        &self,
        execution_id: &str,
        step_id: &str,
        artifact_type: &str,
        content: &str,
    ) -> bool {
        if !require("execution_id", execution_id)
            || !require("step_id", step_id)
            || !require("artifact_type", artifact_type)
        {
            return false;
        }

        let request = LogArtifactRequest {
            artifact_type,
            content,
            description: None,
        };
        report(
            self.api.log_artifact(execution_id, step_id, &request).await,
            "Failed to log artifact",
            || tracing::info!(artifact_type, step_id, "Artifact logged"),
        )
    }

    /// Log a plain text artifact.
    pub async fn log_text_artifact(
        &self,
        execution_id: &str,
        step_id: &str,
        message: &str,
    ) -> bool {
        self.log_artifact(execution_id, step_id, ArtifactType::Log.as_str(), message)
            .await
    }

    /// Normalize any value into JSON and log it.
    ///
    /// Normalization never fails, so the result only reflects the HTTP call.
    pub async fn log_json_artifact<T: Loggable + ?Sized>(
        &self,
        execution_id: &str,
        step_id: &str,
        data: &T,
    ) -> bool {
        let content = self.normalizer.normalize(&data);
        self.log_artifact(
            execution_id,
            step_id,
            ArtifactType::JsonData.as_str(),
            content.as_str(),
        )
        .await
    }

    /// Process an image input and upload it.
    ///
    /// Returns `false` without contacting the server when the image cannot be processed.
    pub async fn log_image_artifact(
        &self,
        execution_id: &str,
        step_id: &str,
        image: ImageInput,
        description: &str,
        filename: Option<&str>,
    ) -> bool {
        if !require("execution_id", execution_id)
            || !require("step_id", step_id)
            || !require("description", description)
        {
            return false;
        }

        let encoded = match process_image_input(image, filename) {
            Ok(encoded) => encoded,
            Err(err) => {
                tracing::error!(error = %err, "Could not process the provided image");
                return false;
            }
        };

        report(
            self.api
                .upload_image(execution_id, step_id, description, encoded)
                .await,
            "Failed to log image artifact",
            || tracing::info!(description, step_id, "Image artifact logged"),
        )
    }

    /// List every execution on the server.
    pub async fn fetch_executions(&self) -> Option<Vec<ExecutionResponse>> {
        self.api
            .fetch_executions()
            .await
            .inspect_err(|err| tracing::error!(error = %err, "Failed to fetch executions"))
            .ok()
    }

    /// Fetch one execution; `None` when it is unknown or the request failed.
    pub async fn get_execution(&self, execution_id: &str) -> Option<ExecutionResponse> {
        if !require("execution_id", execution_id) {
            return None;
        }
        match self.api.get_execution(execution_id).await {
            Ok(execution) => execution,
            Err(err) => {
                tracing::error!(error = %err, execution_id, "Failed to fetch execution");
                None
            }
        }
    }

    /// Delete an execution.
    pub async fn delete_execution(&self, execution_id: &str) -> bool {
        if !require("execution_id", execution_id) {
            return false;
        }
        report(
            self.api.delete_execution(execution_id).await,
            "Failed to delete execution",
            || tracing::info!(execution_id, "Execution deleted"),
        )
    }
}

fn require(name: &'static str, value: &str) -> bool {
    if value.trim().is_empty() {
        tracing::error!("{name} is required");
        false
    } else {
        true
    }
}

fn report(result: Result<(), ApiError>, failure: &'static str, on_success: impl FnOnce()) -> bool {
    match result {
        Ok(()) => {
            on_success();
            true
        }
        Err(err) => {
            tracing::error!(error = %err, "{failure}");
            false
        }
    }
}
