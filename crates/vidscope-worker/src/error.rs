//! Worker error types.

use thiserror::Error;

use vidscope_models::JobId;

pub type WorkerResult<T> = Result<T, WorkerError>;

/// Errors raised by submission, polling and pipeline stages.
///
/// Stage errors display as the message recorded on the failed job.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Job not found: {0}")]
    NotFound(JobId),

    #[error("Frame extraction failed: {0}")]
    Extraction(String),

    #[error("Frame encoding failed: {0}")]
    Encoding(String),

    /// Only the summary call is fatal; per-frame failures are recorded
    /// on the frame.
    #[error("Summary generation failed: {0}")]
    Inference(String),

    #[error("Analysis cancelled")]
    Cancelled,

    #[error("Store error: {0}")]
    Store(#[from] vidscope_store::StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Label used for the failed-jobs metric.
    pub fn reason(&self) -> &'static str {
        match self {
            WorkerError::InvalidInput(_) => "invalid_input",
            WorkerError::NotFound(_) => "not_found",
            WorkerError::Extraction(_) => "extraction",
            WorkerError::Encoding(_) => "encoding",
            WorkerError::Inference(_) => "inference",
            WorkerError::Cancelled => "cancelled",
            WorkerError::Store(_) => "store",
            WorkerError::Io(_) => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_messages() {
        assert_eq!(
            WorkerError::Extraction("no frames".into()).to_string(),
            "Frame extraction failed: no frames"
        );
        assert_eq!(
            WorkerError::Inference("quota".into()).to_string(),
            "Summary generation failed: quota"
        );
        assert_eq!(WorkerError::Cancelled.to_string(), "Analysis cancelled");
        assert_eq!(
            WorkerError::invalid_input("No video data provided").to_string(),
            "No video data provided"
        );
    }
}
