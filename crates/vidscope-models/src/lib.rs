//! Shared data models for vidscope.
//!
//! This crate provides Serde-serializable types for:
//! - Analysis jobs and their lifecycle status
//! - Sampled frames and per-frame analysis
//! - Progress checkpoints used by the pipeline stages

pub mod frame;
pub mod job;
pub mod progress;

// Re-export common types
pub use frame::{
    AnalysisResult, Frame, FrameAnalysis, ImagePayload, ImagePayloadError, VisualAnalysis,
};
pub use job::{Job, JobId, JobProgress, JobStatus};
