//! The four-stage analysis pipeline.
//!
//! Extraction (10→30), encoding (30→60), per-frame inference (60→90) and
//! summary inference (90→100) run sequentially inside one task per job.
//! Every progress change is written to the job store so pollers see it.
//! The working directory and the upload are removed whatever the outcome.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tracing::{error, warn, Instrument};

use vidscope_media::{encode_frame, remove_file_logged, FrameSampler, MediaError, SampledFrame, WorkDir};
use vidscope_models::progress::{self, stage_progress};
use vidscope_models::{AnalysisResult, Frame, FrameAnalysis, Job};
use vidscope_store::JobStore;
use vidscope_vision::{build_digest, frame_prompt, parse_frame_analysis, summary_prompt, VisionModel};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::metrics;

/// Attempts made to persist a job's terminal state.
const MAX_TERMINAL_WRITE_ATTEMPTS: u32 = 3;

/// Base delay between terminal write attempts (milliseconds).
const RETRY_BASE_DELAY_MS: u64 = 50;

/// The job record a pipeline task owns.
struct JobHandle {
    job: Job,
    store: Arc<dyn JobStore>,
    ttl: Duration,
}

impl JobHandle {
    async fn save(&self) {
        if let Err(e) = self.store.set(&self.job.id, &self.job, self.ttl).await {
            warn!(job_id = %self.job.id, "Failed to persist job state: {}", e);
        }
    }

    async fn start(&mut self) {
        self.job.start();
        self.save().await;
    }

    async fn progress(&mut self, value: u8) {
        let before = self.job.progress;
        self.job.set_progress(value);
        if self.job.progress != before {
            self.save().await;
        }
    }

    async fn complete(&mut self, result: AnalysisResult) {
        self.job.complete(result);
        self.save_terminal().await;
    }

    async fn fail(&mut self, message: String) {
        self.job.fail(message);
        self.save_terminal().await;
    }

    /// Persist a terminal state, retrying with linear backoff. Pollers keep
    /// seeing `processing` until this lands.
    async fn save_terminal(&self) {
        for attempt in 0..MAX_TERMINAL_WRITE_ATTEMPTS {
            match self.store.set(&self.job.id, &self.job, self.ttl).await {
                Ok(()) => return,
                Err(e) if attempt + 1 < MAX_TERMINAL_WRITE_ATTEMPTS => {
                    warn!(
                        job_id = %self.job.id,
                        attempt = attempt + 1,
                        error = %e,
                        "Failed to persist terminal job state, retrying"
                    );
                    let delay = Duration::from_millis(RETRY_BASE_DELAY_MS * (attempt as u64 + 1));
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    error!(
                        job_id = %self.job.id,
                        status = %self.job.status,
                        error = %e,
                        "Giving up persisting terminal job state"
                    );
                }
            }
        }
    }
}

fn check_cancelled(cancel: &watch::Receiver<bool>) -> WorkerResult<()> {
    if *cancel.borrow() {
        Err(WorkerError::Cancelled)
    } else {
        Ok(())
    }
}

/// Runs jobs through sampling, encoding and inference.
pub struct AnalysisPipeline {
    config: WorkerConfig,
    sampler: Arc<dyn FrameSampler>,
    vision: Arc<dyn VisionModel>,
    store: Arc<dyn JobStore>,
}

impl AnalysisPipeline {
    pub fn new(
        config: WorkerConfig,
        sampler: Arc<dyn FrameSampler>,
        vision: Arc<dyn VisionModel>,
        store: Arc<dyn JobStore>,
    ) -> Self {
        Self {
            config,
            sampler,
            vision,
            store,
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Run `job` to a terminal state and return the final record.
    ///
    /// Failures never escape: they are written to the job as `error`.
    pub async fn run(&self, job: Job, upload: PathBuf, cancel: watch::Receiver<bool>) -> Job {
        let logger = JobLogger::new(&job.id, "video_analysis");
        let span = logger.create_span();
        self.run_logged(job, upload, cancel, logger)
            .instrument(span)
            .await
    }

    async fn run_logged(
        &self,
        job: Job,
        upload: PathBuf,
        cancel: watch::Receiver<bool>,
        logger: JobLogger,
    ) -> Job {
        let started = Instant::now();
        let mut handle = JobHandle {
            job,
            store: Arc::clone(&self.store),
            ttl: self.config.job_ttl,
        };
        handle.start().await;
        logger.log_start(&format!("analyzing {}", upload.display()));

        let outcome =
            match WorkDir::create(self.config.frames_dir(), handle.job.id.as_str()).await {
                Ok(work_dir) => {
                    let outcome = self
                        .execute(&mut handle, &upload, work_dir.path(), &cancel, &logger)
                        .await;
                    work_dir.cleanup().await;
                    outcome
                }
                Err(e) => Err(WorkerError::Extraction(e.detail())),
            };
        remove_file_logged(&upload).await;

        match outcome {
            Ok(result) => {
                let frame_count = result.frames.len();
                handle.complete(result).await;
                metrics::record_job_completed(started.elapsed().as_secs_f64());
                logger.log_completion(
                    started.elapsed(),
                    &format!("{} frames analyzed", frame_count),
                );
            }
            Err(e) => {
                metrics::record_job_failed(e.reason());
                logger.log_error(&e.to_string());
                handle.fail(e.to_string()).await;
            }
        }

        handle.job
    }

    async fn execute(
        &self,
        handle: &mut JobHandle,
        upload: &Path,
        frames_dir: &Path,
        cancel: &watch::Receiver<bool>,
        logger: &JobLogger,
    ) -> WorkerResult<AnalysisResult> {
        let sampled = self
            .extract_frames(handle, upload, frames_dir, cancel, logger)
            .await?;
        let mut frames = self.encode_frames(handle, &sampled, cancel, logger).await?;
        self.analyze_frames(handle, &mut frames, cancel, logger)
            .await?;
        let summary = self.summarize(handle, &frames, cancel, logger).await?;

        Ok(AnalysisResult { frames, summary })
    }

    async fn extract_frames(
        &self,
        handle: &mut JobHandle,
        upload: &Path,
        frames_dir: &Path,
        cancel: &watch::Receiver<bool>,
        logger: &JobLogger,
    ) -> WorkerResult<Vec<SampledFrame>> {
        check_cancelled(cancel)?;
        handle.progress(progress::EXTRACTION_START).await;
        let stage = Instant::now();

        let mut sampled = self
            .sampler
            .sample(upload, frames_dir, cancel.clone())
            .await
            .map_err(|e| match e {
                MediaError::Cancelled => WorkerError::Cancelled,
                other => WorkerError::Extraction(other.detail()),
            })?;
        if sampled.is_empty() {
            return Err(WorkerError::Extraction(MediaError::NoFrames.to_string()));
        }
        sampled.sort_by_key(|f| f.timestamp);

        handle.progress(progress::EXTRACTION_DONE).await;
        metrics::record_stage_duration("extraction", stage.elapsed().as_secs_f64());
        logger.log_stage(
            "extraction",
            stage.elapsed(),
            &format!("{} frames sampled", sampled.len()),
        );
        Ok(sampled)
    }

    async fn encode_frames(
        &self,
        handle: &mut JobHandle,
        sampled: &[SampledFrame],
        cancel: &watch::Receiver<bool>,
        logger: &JobLogger,
    ) -> WorkerResult<Vec<Frame>> {
        let stage = Instant::now();
        let total = sampled.len();
        let mut frames = Vec::with_capacity(total);

        for (index, sample) in sampled.iter().enumerate() {
            check_cancelled(cancel)?;
            let image = encode_frame(&sample.path)
                .await
                .map_err(|e| WorkerError::Encoding(e.detail()))?;
            frames.push(Frame::new(sample.timestamp, image));
            handle
                .progress(stage_progress(
                    progress::EXTRACTION_DONE,
                    progress::ENCODING_DONE,
                    index + 1,
                    total,
                ))
                .await;
        }

        metrics::record_stage_duration("encoding", stage.elapsed().as_secs_f64());
        logger.log_stage(
            "encoding",
            stage.elapsed(),
            &format!("{} frames encoded", total),
        );
        Ok(frames)
    }

    /// Per-frame inference. A failed call is recorded on that frame and the
    /// stage moves on.
    async fn analyze_frames(
        &self,
        handle: &mut JobHandle,
        frames: &mut [Frame],
        cancel: &watch::Receiver<bool>,
        logger: &JobLogger,
    ) -> WorkerResult<()> {
        let stage = Instant::now();
        let total = frames.len();
        let mut failed = 0usize;

        for (index, frame) in frames.iter_mut().enumerate() {
            check_cancelled(cancel)?;
            let prompt = frame_prompt(frame.timestamp);

            let analysis = match self.vision.analyze_image(&prompt, &frame.image).await {
                Ok(reply) => parse_frame_analysis(&reply),
                Err(e) => {
                    logger.log_frame_failure(frame.timestamp, &e.to_string());
                    FrameAnalysis::Failed {
                        error: e.to_string(),
                    }
                }
            };
            if analysis.is_failed() {
                failed += 1;
            }
            metrics::record_frame_analyzed(analysis.is_failed());
            frame.analysis = Some(analysis);

            handle
                .progress(stage_progress(
                    progress::ENCODING_DONE,
                    progress::INFERENCE_DONE,
                    index + 1,
                    total,
                ))
                .await;
        }

        metrics::record_stage_duration("inference", stage.elapsed().as_secs_f64());
        logger.log_stage(
            "inference",
            stage.elapsed(),
            &format!("{} frames analyzed, {} failed", total, failed),
        );
        Ok(())
    }

    async fn summarize(
        &self,
        handle: &mut JobHandle,
        frames: &[Frame],
        cancel: &watch::Receiver<bool>,
        logger: &JobLogger,
    ) -> WorkerResult<String> {
        check_cancelled(cancel)?;
        handle.progress(progress::INFERENCE_DONE).await;
        let stage = Instant::now();

        let prompt = summary_prompt(&build_digest(frames));
        let summary = self
            .vision
            .generate_text(&prompt)
            .await
            .map_err(|e| WorkerError::Inference(e.to_string()))?;

        metrics::record_stage_duration("summary", stage.elapsed().as_secs_f64());
        logger.log_stage("summary", stage.elapsed(), "summary generated");
        Ok(summary)
    }
}
