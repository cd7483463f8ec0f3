//! HTTP client wrapper for the Debugattor REST API.

use crate::api::types::{
    ApiError, ArtifactType, ExecutionResponse, LogArtifactRequest, RegisterStepRequest,
    StepResponse,
};
use crate::config::get_config;
use crate::imaging::EncodedImage;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Lightweight HTTP client for Debugattor operations.
///
/// Every method performs a single request and propagates transport and status
/// failures to the caller. No retries are attempted.
#[derive(Debug, Clone)]
pub struct ApiClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
}

impl ApiClient {
    /// Construct a client from the process configuration.
    pub fn from_config() -> Result<Self, ApiError> {
        let config = get_config();
        Self::new(&config.api_url, config.timeout())
    }

    /// Construct a client for an explicit base URL and per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(concat!("debugattor-sdk/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        let base_url = normalize_base_url(base_url).map_err(ApiError::InvalidUrl)?;
        tracing::debug!(
            url = %base_url,
            timeout_secs = timeout.as_secs(),
            "Initialized Debugattor HTTP client"
        );

        Ok(Self { client, base_url })
    }

    /// Base URL every endpoint path is joined onto.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Start a new execution.
    pub async fn start_execution(&self) -> Result<ExecutionResponse, ApiError> {
        let response = self.request(Method::POST, "executions").send().await?;
        self.read_with_id(response).await
    }

    /// Register a named step on an execution.
    pub async fn register_step(
        &self,
        execution_id: &str,
        name: &str,
    ) -> Result<StepResponse, ApiError> {
        let response = self
            .request(Method::POST, &format!("executions/{execution_id}/steps"))
            .json(&RegisterStepRequest { name })
            .send()
            .await?;
        self.read_with_id(response).await
    }

    /// Mark a step as completed.
    pub async fn complete_step(&self, execution_id: &str, step_id: &str) -> Result<(), ApiError> {
        self.post_empty(&format!(
            "executions/{execution_id}/steps/{step_id}/complete"
        ))
        .await
    }

    /// Mark a step as failed.
    pub async fn fail_step(&self, execution_id: &str, step_id: &str) -> Result<(), ApiError> {
        self.post_empty(&format!("executions/{execution_id}/steps/{step_id}/fail"))
            .await
    }

    /// Mark an execution as completed.
    pub async fn complete_execution(&self, execution_id: &str) -> Result<(), ApiError> {
        self.post_empty(&format!("executions/{execution_id}/complete"))
            .await
    }

    /// Mark an execution as failed.
    pub async fn fail_execution(&self, execution_id: &str) -> Result<(), ApiError> {
        self.post_empty(&format!("executions/{execution_id}/fail"))
            .await
    }

    /// Log an inline artifact against a step.
    pub async fn log_artifact(
        &self,
        execution_id: &str,
        step_id: &str,
        artifact: &LogArtifactRequest<'_>,
    ) -> Result<(), ApiError> {
        let response = self
            .request(
                Method::POST,
                &format!("executions/{execution_id}/steps/{step_id}/artifacts"),
            )
            .json(artifact)
            .send()
            .await?;

        self.ensure_success(response, || {
            tracing::debug!(
                execution_id,
                step_id,
                artifact_type = artifact.artifact_type,
                "Artifact logged"
            );
        })
        .await
    }

    /// Upload an encoded image as a multipart artifact.
    pub async fn upload_image(
        &self,
        execution_id: &str,
        step_id: &str,
        description: &str,
        image: EncodedImage,
    ) -> Result<(), ApiError> {
        let size = image.bytes.len();
        let file = Part::bytes(image.bytes)
            .file_name(image.filename)
            .mime_str(&image.mime_type)?;
        let form = Form::new()
            .text("type", ArtifactType::Image.as_str())
            .text("description", description.to_string())
            .part("file", file);

        let response = self
            .request(
                Method::POST,
                &format!("executions/{execution_id}/steps/{step_id}/artifacts/upload"),
            )
            .multipart(form)
            .send()
            .await?;

        self.ensure_success(response, || {
            tracing::debug!(execution_id, step_id, size, "Image artifact uploaded");
        })
        .await
    }

    /// List every execution known to the server.
    pub async fn fetch_executions(&self) -> Result<Vec<ExecutionResponse>, ApiError> {
        let response = self.request(Method::GET, "executions").send().await?;
        self.read_json(response).await
    }

    /// Fetch one execution, returning `None` when the server does not know it.
    pub async fn get_execution(
        &self,
        execution_id: &str,
    ) -> Result<Option<ExecutionResponse>, ApiError> {
        let response = self
            .request(Method::GET, &format!("executions/{execution_id}"))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(execution_id, "Execution not found");
            return Ok(None);
        }
        self.read_json(response).await.map(Some)
    }

    /// Delete an execution and everything recorded under it.
    pub async fn delete_execution(&self, execution_id: &str) -> Result<(), ApiError> {
        let response = self
            .request(Method::DELETE, &format!("executions/{execution_id}"))
            .send()
            .await?;

        self.ensure_success(response, || {
            tracing::debug!(execution_id, "Execution deleted");
        })
        .await
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format_endpoint(&self.base_url, path);
        tracing::debug!(method = method.as_str(), url = url.as_str(), "Sending request");
        self.client.request(method, url)
    }

    async fn post_empty(&self, path: &str) -> Result<(), ApiError> {
        let response = self.request(Method::POST, path).send().await?;
        self.ensure_success(response, || {
            tracing::debug!(path, "Request acknowledged");
        })
        .await
    }

    async fn ensure_success<F>(
        &self,
        response: reqwest::Response,
        on_success: F,
    ) -> Result<(), ApiError>
    where
        F: FnOnce(),
    {
        if response.status().is_success() {
            on_success();
            Ok(())
        } else {
            Err(status_error(response).await)
        }
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        Ok(response.json().await?)
    }

    /// Decode a response whose `id` field the caller depends on.
    async fn read_with_id<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let body: Value = self.read_json(response).await?;
        if body.get("id").is_none_or(Value::is_null) {
            return Err(ApiError::MissingField("id"));
        }
        Ok(serde_json::from_value(body)?)
    }
}

async fn status_error(response: reqwest::Response) -> ApiError {
    let status = response.status();
    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    let error = ApiError::UnexpectedStatus { status, body };
    tracing::error!(%url, error = %error, "Debugattor request failed");
    error
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}

fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}
