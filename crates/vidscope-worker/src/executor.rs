//! Job executor.
//!
//! Submission stores the upload and a queued job, then spawns the pipeline
//! and returns. The job identifier is the only handle callers keep; status
//! and results are read back from the job store.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};

use vidscope_media::{remove_file_logged, FrameSampler};
use vidscope_models::{AnalysisResult, Job, JobId, JobProgress, JobStatus};
use vidscope_store::JobStore;
use vidscope_vision::VisionModel;

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::metrics;
use crate::pipeline::AnalysisPipeline;

/// What a results poll sees.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// The job is done.
    Ready(AnalysisResult),
    /// Still running, or failed.
    Pending(JobProgress),
}

/// Decrements the in-flight count when a pipeline task ends, even by panic.
struct InFlightGuard(Arc<AtomicUsize>);

impl InFlightGuard {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        let count = counter.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::set_jobs_in_flight(count);
        Self(Arc::clone(counter))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let count = self.0.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        metrics::set_jobs_in_flight(count);
    }
}

async fn load(store: &dyn JobStore, id: &JobId) -> WorkerResult<Job> {
    store
        .get(id)
        .await?
        .ok_or_else(|| WorkerError::NotFound(id.clone()))
}

/// Current status and progress of a job in `store`.
pub async fn job_status(store: &dyn JobStore, id: &JobId) -> WorkerResult<JobProgress> {
    Ok(JobProgress::from(&load(store, id).await?))
}

/// The job's result once done, otherwise its status.
///
/// Unknown and expired ids both answer `NotFound`.
pub async fn job_result(store: &dyn JobStore, id: &JobId) -> WorkerResult<JobOutcome> {
    let job = load(store, id).await?;
    match (job.status, job.result) {
        (JobStatus::Done, Some(result)) => Ok(JobOutcome::Ready(result)),
        _ => Ok(JobOutcome::Pending(JobProgress {
            status: job.status,
            progress: job.progress,
            error: job.error,
        })),
    }
}

/// Spawns one pipeline task per submitted video.
pub struct JobExecutor {
    pipeline: Arc<AnalysisPipeline>,
    store: Arc<dyn JobStore>,
    shutdown: watch::Sender<bool>,
    in_flight: Arc<AtomicUsize>,
}

impl JobExecutor {
    pub fn new(
        config: WorkerConfig,
        sampler: Arc<dyn FrameSampler>,
        vision: Arc<dyn VisionModel>,
        store: Arc<dyn JobStore>,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        let pipeline = AnalysisPipeline::new(config, sampler, vision, Arc::clone(&store));

        Self {
            pipeline: Arc::new(pipeline),
            store,
            shutdown,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        self.pipeline.config()
    }

    pub fn store(&self) -> &Arc<dyn JobStore> {
        &self.store
    }

    /// Number of pipeline tasks still running.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Accept a video and start analyzing it in the background.
    pub async fn submit(&self, video: &[u8]) -> WorkerResult<JobId> {
        if video.is_empty() {
            return Err(WorkerError::invalid_input("No video data provided"));
        }

        let job = Job::new();
        let upload = self.write_upload(&job.id, video).await?;

        let config = self.config();
        if let Err(e) = self.store.set(&job.id, &job, config.job_ttl).await {
            remove_file_logged(&upload).await;
            return Err(e.into());
        }

        metrics::record_job_submitted();
        info!(job_id = %job.id, bytes = video.len(), "Job submitted");

        let job_id = job.id.clone();
        let pipeline = Arc::clone(&self.pipeline);
        let cancel = self.shutdown.subscribe();
        let guard = InFlightGuard::enter(&self.in_flight);

        tokio::spawn(async move {
            let _guard = guard;
            pipeline.run(job, upload, cancel).await;
        });

        Ok(job_id)
    }

    async fn write_upload(&self, job_id: &JobId, video: &[u8]) -> WorkerResult<PathBuf> {
        let dir = self.config().uploads_dir();
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(format!("{}.mp4", job_id));
        tokio::fs::write(&path, video).await?;
        Ok(path)
    }

    /// Current status and progress of a job.
    pub async fn status(&self, id: &JobId) -> WorkerResult<JobProgress> {
        job_status(self.store.as_ref(), id).await
    }

    /// The job's result once done, otherwise its status.
    pub async fn result(&self, id: &JobId) -> WorkerResult<JobOutcome> {
        job_result(self.store.as_ref(), id).await
    }

    /// Signal every running and future pipeline to stop at its next checkpoint.
    pub fn shutdown(&self) {
        info!("Cancelling {} in-flight jobs", self.in_flight());
        self.shutdown.send_replace(true);
    }

    /// Wait for running pipelines to finish. Returns false on timeout.
    pub async fn wait_for_jobs(&self, timeout: Duration) -> bool {
        let drained = tokio::time::timeout(timeout, async {
            while self.in_flight() > 0 {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        })
        .await
        .is_ok();

        if !drained {
            warn!("{} jobs still running after {:?}", self.in_flight(), timeout);
        }
        drained
    }
}
