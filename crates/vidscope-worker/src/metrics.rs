//! Pipeline metrics.
//!
//! Recorded through the `metrics` facade; the API binary installs the
//! Prometheus recorder. Without a recorder these calls are no-ops.

use metrics::{counter, gauge, histogram};

pub mod names {
    pub const JOBS_SUBMITTED_TOTAL: &str = "vidscope_jobs_submitted_total";
    pub const JOBS_COMPLETED_TOTAL: &str = "vidscope_jobs_completed_total";
    pub const JOBS_FAILED_TOTAL: &str = "vidscope_jobs_failed_total";
    pub const JOBS_IN_FLIGHT: &str = "vidscope_jobs_in_flight";
    pub const JOB_DURATION_SECONDS: &str = "vidscope_job_duration_seconds";
    pub const STAGE_DURATION_SECONDS: &str = "vidscope_stage_duration_seconds";
    pub const FRAMES_ANALYZED_TOTAL: &str = "vidscope_frames_analyzed_total";
    pub const FRAME_INFERENCE_FAILURES_TOTAL: &str = "vidscope_frame_inference_failures_total";
}

pub fn record_job_submitted() {
    counter!(names::JOBS_SUBMITTED_TOTAL).increment(1);
}

pub fn record_job_completed(duration_secs: f64) {
    counter!(names::JOBS_COMPLETED_TOTAL).increment(1);
    histogram!(names::JOB_DURATION_SECONDS).record(duration_secs);
}

pub fn record_job_failed(reason: &'static str) {
    counter!(names::JOBS_FAILED_TOTAL, "reason" => reason).increment(1);
}

pub fn set_jobs_in_flight(count: usize) {
    gauge!(names::JOBS_IN_FLIGHT).set(count as f64);
}

pub fn record_stage_duration(stage: &'static str, duration_secs: f64) {
    histogram!(names::STAGE_DURATION_SECONDS, "stage" => stage).record(duration_secs);
}

/// One frame went through inference; `failed` marks a recovered failure.
pub fn record_frame_analyzed(failed: bool) {
    counter!(names::FRAMES_ANALYZED_TOTAL).increment(1);
    if failed {
        counter!(names::FRAME_INFERENCE_FAILURES_TOTAL).increment(1);
    }
}
