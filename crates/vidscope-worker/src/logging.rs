//! Structured job logging.
//!
//! Every line carries `job_id` and `operation` so a job's lifecycle can be
//! followed in JSON logs.

use std::time::Duration;

use tracing::{error, info, warn, Span};
use vidscope_models::JobId;

/// Logger bound to one job.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    operation: String,
}

impl JobLogger {
    pub fn new(job_id: &JobId, operation: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job started: {}", message
        );
    }

    /// A stage finished.
    pub fn log_stage(&self, stage: &str, elapsed: Duration, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            stage = stage,
            elapsed_ms = elapsed.as_millis() as u64,
            "Stage {} done: {}", stage, message
        );
    }

    /// A single frame's inference failed; the job continues.
    pub fn log_frame_failure(&self, timestamp: u32, message: &str) {
        warn!(
            job_id = %self.job_id,
            operation = %self.operation,
            frame = timestamp,
            "Frame {}s analysis failed: {}", timestamp, message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job error: {}", message
        );
    }

    pub fn log_completion(&self, elapsed: Duration, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            elapsed_ms = elapsed.as_millis() as u64,
            "Job completed: {}", message
        );
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Span wrapping the whole pipeline task.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "job",
            job_id = %self.job_id,
            operation = %self.operation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_logger_creation() {
        let job_id = JobId::new();
        let logger = JobLogger::new(&job_id, "video_analysis");

        assert_eq!(logger.job_id(), job_id.to_string());
        assert_eq!(logger.operation(), "video_analysis");
    }
}
