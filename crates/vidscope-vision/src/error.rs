//! Vision client error types.

use thiserror::Error;

pub type VisionResult<T> = Result<T, VisionError>;

#[derive(Debug, Error)]
pub enum VisionError {
    #[error("GEMINI_API_KEY not configured")]
    MissingApiKey,

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Inference service returned no content")]
    EmptyResponse,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl VisionError {
    /// True when the error comes from local configuration, not the service.
    pub fn is_misconfiguration(&self) -> bool {
        matches!(self, VisionError::MissingApiKey)
    }
}
