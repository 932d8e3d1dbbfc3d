//! Vision-inference client.
//!
//! This crate provides:
//! - The `VisionModel` seam the pipeline calls through
//! - A Gemini `generateContent` client with inline image parts
//! - Fixed per-frame and summary prompts
//! - Lenient parsing of model replies into `FrameAnalysis`

pub mod client;
pub mod error;
pub mod parse;
pub mod prompts;
pub mod types;

pub use client::{GeminiVisionClient, VisionConfig, VisionModel};
pub use error::{VisionError, VisionResult};
pub use parse::parse_frame_analysis;
pub use prompts::{build_digest, frame_prompt, summary_prompt, HOOK_WINDOW_SECS};
