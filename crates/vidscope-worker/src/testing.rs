//! Scripted collaborators for pipeline and HTTP tests.
//!
//! `ScriptedSampler` writes small fake frame files whose bytes name the
//! frame's timestamp; `ScriptedVision` reads that back from the image
//! payload so replies and failures can be keyed by timestamp.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use vidscope_media::{FrameSampler, MediaError, MediaResult, SampledFrame};
use vidscope_models::ImagePayload;
use vidscope_vision::{VisionError, VisionModel, VisionResult};

/// Sampler that fabricates `frames` one-second frames.
#[derive(Debug, Clone)]
pub struct ScriptedSampler {
    frames: u32,
    failure: Option<String>,
    delay: Option<Duration>,
    missing: HashSet<u32>,
}

impl ScriptedSampler {
    pub fn new(frames: u32) -> Self {
        Self {
            frames,
            failure: None,
            delay: None,
            missing: HashSet::new(),
        }
    }

    /// Sampler that fails like an undecodable video.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            frames: 0,
            failure: Some(message.into()),
            delay: None,
            missing: HashSet::new(),
        }
    }

    /// Hold the extraction stage open; a cancellation signal cuts it short.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Report this frame without writing its file.
    pub fn with_missing_frame(mut self, timestamp: u32) -> Self {
        self.missing.insert(timestamp);
        self
    }
}

#[async_trait]
impl FrameSampler for ScriptedSampler {
    async fn sample(
        &self,
        video: &Path,
        out_dir: &Path,
        mut cancel: watch::Receiver<bool>,
    ) -> MediaResult<Vec<SampledFrame>> {
        if let Some(delay) = self.delay {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                Ok(_) = cancel.wait_for(|cancelled| *cancelled) => {
                    return Err(MediaError::Cancelled);
                }
            }
        }

        if !tokio::fs::try_exists(video).await.unwrap_or(false) {
            return Err(MediaError::FileNotFound(video.to_path_buf()));
        }
        if let Some(message) = &self.failure {
            return Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                Some(message.clone()),
                Some(1),
            ));
        }

        tokio::fs::create_dir_all(out_dir).await?;
        let mut sampled = Vec::new();
        for timestamp in 1..=self.frames {
            let path = out_dir.join(format!("frame-{:04}.jpg", timestamp));
            if !self.missing.contains(&timestamp) {
                tokio::fs::write(&path, format!("frame {}", timestamp)).await?;
            }
            sampled.push(SampledFrame { timestamp, path });
        }
        Ok(sampled)
    }
}

/// Vision model with canned replies keyed by frame timestamp.
#[derive(Debug, Default)]
pub struct ScriptedVision {
    failing_frames: HashSet<u32>,
    prose_frames: HashSet<u32>,
    fail_summary: bool,
    frame_prompts: Mutex<Vec<(u32, String)>>,
    summary_prompts: Mutex<Vec<String>>,
}

impl ScriptedVision {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inference for this frame returns an error.
    pub fn fail_frame(mut self, timestamp: u32) -> Self {
        self.failing_frames.insert(timestamp);
        self
    }

    /// Inference for this frame returns prose instead of JSON.
    pub fn prose_frame(mut self, timestamp: u32) -> Self {
        self.prose_frames.insert(timestamp);
        self
    }

    pub fn fail_summary(mut self) -> Self {
        self.fail_summary = true;
        self
    }

    /// `(timestamp, prompt)` for every frame call, in call order.
    pub fn frame_prompts(&self) -> Vec<(u32, String)> {
        self.frame_prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    pub fn summary_prompts(&self) -> Vec<String> {
        self.summary_prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    fn timestamp_of(image: &ImagePayload) -> VisionResult<u32> {
        let bytes = image
            .decode()
            .map_err(|e| VisionError::RequestFailed(e.to_string()))?;
        String::from_utf8_lossy(&bytes)
            .strip_prefix("frame ")
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| VisionError::RequestFailed("unrecognized test frame".into()))
    }
}

#[async_trait]
impl VisionModel for ScriptedVision {
    async fn analyze_image(&self, prompt: &str, image: &ImagePayload) -> VisionResult<String> {
        let timestamp = Self::timestamp_of(image)?;
        if let Ok(mut prompts) = self.frame_prompts.lock() {
            prompts.push((timestamp, prompt.to_string()));
        }

        if self.failing_frames.contains(&timestamp) {
            return Err(VisionError::RequestFailed(
                "Gemini API returned 503 Service Unavailable: overloaded".into(),
            ));
        }
        if self.prose_frames.contains(&timestamp) {
            return Ok(format!("Frame {} looks fine to me.", timestamp));
        }
        Ok(format!(
            r#"{{"description": "Scene at {t}s", "emotionalImpact": "Curious", "appealScore": 7, "suggestedImprovements": ["Tighter crop"], "attentionGrabbing": {hook}}}"#,
            t = timestamp,
            hook = timestamp <= 3
        ))
    }

    async fn generate_text(&self, prompt: &str) -> VisionResult<String> {
        if let Ok(mut prompts) = self.summary_prompts.lock() {
            prompts.push(prompt.to_string());
        }
        if self.fail_summary {
            return Err(VisionError::EmptyResponse);
        }
        Ok("Strong opening hook; attention dips mid-video.".to_string())
    }
}
