//! FFmpeg CLI wrapper for video frame sampling.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - Cancellation and timeout support via tokio
//! - One-frame-per-second sampling into a working directory
//! - Base64 encoding of sampled frames
//! - Scoped per-job working directories with best-effort cleanup

pub mod command;
pub mod encode;
pub mod error;
pub mod frames;
pub mod workdir;

pub use command::{check_ffmpeg, FfmpegCommand, FfmpegRunner};
pub use encode::{encode_frame, mime_type_for};
pub use error::{MediaError, MediaResult};
pub use frames::{FfmpegFrameSampler, FrameSampler, SampledFrame};
pub use workdir::{remove_file_logged, WorkDir};
