//! Frame sampling.
//!
//! Frames are sampled at one per second and written as numbered JPEGs
//! (`frame-0001.jpg`, `frame-0002.jpg`, ...). Frame `N` is tagged with
//! timestamp `N` seconds.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// File name prefix for sampled frames.
pub const FRAME_PREFIX: &str = "frame-";
/// File extension for sampled frames.
pub const FRAME_EXTENSION: &str = "jpg";
/// Frames sampled per second of video.
pub const SAMPLE_FPS: u32 = 1;

/// A sampled frame on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampledFrame {
    /// Seconds from video start
    pub timestamp: u32,
    /// Path to the image file
    pub path: PathBuf,
}

/// Decodes a video into an ordered list of still frames.
#[async_trait]
pub trait FrameSampler: Send + Sync {
    /// Sample frames from `video` into `out_dir`, ordered by timestamp.
    async fn sample(
        &self,
        video: &Path,
        out_dir: &Path,
        cancel: watch::Receiver<bool>,
    ) -> MediaResult<Vec<SampledFrame>>;
}

/// FFmpeg-backed sampler.
#[derive(Debug, Clone, Default)]
pub struct FfmpegFrameSampler {
    /// Optional per-invocation timeout
    timeout_secs: Option<u64>,
}

impl FfmpegFrameSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill FFmpeg if sampling takes longer than `secs`.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Build the sampling command for a video.
    pub fn command(video: &Path, out_dir: &Path) -> FfmpegCommand {
        let pattern = out_dir.join(format!("{}%04d.{}", FRAME_PREFIX, FRAME_EXTENSION));
        FfmpegCommand::new(video, pattern)
            .sample_rate(SAMPLE_FPS)
            .image_quality(3)
            .log_level("error")
    }
}

#[async_trait]
impl FrameSampler for FfmpegFrameSampler {
    async fn sample(
        &self,
        video: &Path,
        out_dir: &Path,
        cancel: watch::Receiver<bool>,
    ) -> MediaResult<Vec<SampledFrame>> {
        if !tokio::fs::try_exists(video).await.unwrap_or(false) {
            return Err(MediaError::FileNotFound(video.to_path_buf()));
        }
        tokio::fs::create_dir_all(out_dir).await?;

        let mut runner = FfmpegRunner::new().with_cancel(cancel);
        if let Some(secs) = self.timeout_secs {
            runner = runner.with_timeout(secs);
        }
        runner.run(&Self::command(video, out_dir)).await?;

        let frames = list_frames(out_dir).await?;
        if frames.is_empty() {
            return Err(MediaError::NoFrames);
        }

        info!(
            "Sampled {} frames from {}",
            frames.len(),
            video.display()
        );
        Ok(frames)
    }
}

/// Parse the timestamp from a sampled frame's file name.
pub fn frame_timestamp(path: &Path) -> Option<u32> {
    if path.extension()?.to_str()? != FRAME_EXTENSION {
        return None;
    }
    path.file_stem()?
        .to_str()?
        .strip_prefix(FRAME_PREFIX)?
        .parse()
        .ok()
}

/// List sampled frames in a directory, ordered by timestamp.
pub async fn list_frames(dir: &Path) -> MediaResult<Vec<SampledFrame>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut frames = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        match frame_timestamp(&path) {
            Some(timestamp) => frames.push(SampledFrame { timestamp, path }),
            None => debug!("Skipping non-frame file {}", path.display()),
        }
    }

    frames.sort_by_key(|f| f.timestamp);
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sampling_command() {
        let args = FfmpegFrameSampler::command(Path::new("/in/video.mp4"), Path::new("/out"))
            .build_args();
        assert!(args.contains(&"fps=1".to_string()));
        assert_eq!(args.last().unwrap(), "/out/frame-%04d.jpg");
    }

    #[test]
    fn test_frame_timestamp() {
        assert_eq!(frame_timestamp(Path::new("/x/frame-0001.jpg")), Some(1));
        assert_eq!(frame_timestamp(Path::new("/x/frame-0120.jpg")), Some(120));
        assert_eq!(frame_timestamp(Path::new("/x/frame-0001.png")), None);
        assert_eq!(frame_timestamp(Path::new("/x/thumb.jpg")), None);
    }

    #[tokio::test]
    async fn test_list_frames_sorted() {
        let dir = TempDir::new().unwrap();
        for name in ["frame-0003.jpg", "frame-0001.jpg", "frame-0010.jpg", "notes.txt"] {
            tokio::fs::write(dir.path().join(name), b"x").await.unwrap();
        }

        let frames = list_frames(dir.path()).await.unwrap();
        let timestamps: Vec<u32> = frames.iter().map(|f| f.timestamp).collect();
        assert_eq!(timestamps, vec![1, 3, 10]);
    }

    #[tokio::test]
    async fn test_missing_video_is_reported() {
        let dir = TempDir::new().unwrap();
        let (_tx, rx) = watch::channel(false);
        let err = FfmpegFrameSampler::new()
            .sample(&dir.path().join("missing.mp4"), dir.path(), rx)
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
