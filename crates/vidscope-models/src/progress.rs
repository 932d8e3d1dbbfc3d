//! Progress checkpoints for the analysis pipeline.
//!
//! Stage boundaries assign fixed values; within the encoding and
//! inference stages progress advances with the number of frames handled.

/// Extraction started.
pub const EXTRACTION_START: u8 = 10;
/// Frames sampled to disk.
pub const EXTRACTION_DONE: u8 = 30;
/// All frames base64-encoded.
pub const ENCODING_DONE: u8 = 60;
/// Every frame sent through inference.
pub const INFERENCE_DONE: u8 = 90;
/// Summary stored, job done.
pub const COMPLETE: u8 = 100;

/// Progress for `done` of `total` items within a stage spanning `start..=end`.
pub fn stage_progress(start: u8, end: u8, done: usize, total: usize) -> u8 {
    if total == 0 || done >= total {
        return end;
    }
    let span = end.saturating_sub(start) as usize;
    start + (span * done / total) as u8
}
