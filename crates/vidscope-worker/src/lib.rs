//! Video analysis worker.
//!
//! This crate provides:
//! - The four-stage analysis pipeline (extract, encode, infer, summarize)
//! - A job executor that spawns one pipeline task per submission
//! - Structured job logging and pipeline metrics
//! - Graceful shutdown through a shared cancellation signal

pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod metrics;
pub mod pipeline;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use executor::{job_result, job_status, JobExecutor, JobOutcome};
pub use logging::JobLogger;
pub use pipeline::AnalysisPipeline;
