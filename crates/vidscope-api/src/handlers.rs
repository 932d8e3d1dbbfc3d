//! Request handlers.

pub mod health;
pub mod video_analysis;

pub use health::*;
pub use video_analysis::*;
