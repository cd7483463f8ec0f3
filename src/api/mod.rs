//! Debugattor REST API transport.

mod client;
mod types;

pub use client::ApiClient;
pub use types::{
    ApiError, ArtifactResponse, ArtifactType, ExecutionResponse, LogArtifactRequest, StepResponse,
    StepStatus,
};
