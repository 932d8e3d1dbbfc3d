//! Application state.

use std::sync::Arc;

use tracing::{info, warn};

use vidscope_media::{check_ffmpeg, FfmpegFrameSampler};
use vidscope_store::{build_store, JobStore, StoreConfig};
use vidscope_vision::GeminiVisionClient;
use vidscope_worker::{JobExecutor, WorkerConfig};

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: Arc<dyn JobStore>,
    /// `Err` holds the reason submissions are refused, e.g. a missing API key.
    executor: Result<Arc<JobExecutor>, String>,
}

impl AppState {
    /// Create new application state from the environment.
    ///
    /// A missing vision API key does not stop the server: polling keeps
    /// working and submissions answer 500 until it is configured.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let store = build_store(&StoreConfig::from_env()?)?;
        let worker_config = WorkerConfig::from_env();
        info!("Work directory: {}", worker_config.work_dir.display());

        if let Err(e) = check_ffmpeg() {
            warn!("{}; frame extraction will fail", e);
        }

        let mut sampler = FfmpegFrameSampler::new();
        if let Some(secs) = worker_config.ffmpeg_timeout_secs {
            sampler = sampler.with_timeout(secs);
        }

        let executor = match GeminiVisionClient::from_env() {
            Ok(vision) => {
                info!("Vision model: {}", vision.model());
                Ok(Arc::new(JobExecutor::new(
                    worker_config,
                    Arc::new(sampler),
                    Arc::new(vision),
                    Arc::clone(&store),
                )))
            }
            Err(e) if e.is_misconfiguration() => {
                warn!("Video analysis disabled: {}", e);
                Err(e.to_string())
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            config,
            store,
            executor,
        })
    }

    /// State around an already-built executor.
    pub fn with_executor(config: ApiConfig, executor: Arc<JobExecutor>) -> Self {
        Self {
            config,
            store: Arc::clone(executor.store()),
            executor: Ok(executor),
        }
    }

    /// State that refuses submissions with `reason`.
    pub fn misconfigured(
        config: ApiConfig,
        store: Arc<dyn JobStore>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            config,
            store,
            executor: Err(reason.into()),
        }
    }

    /// The executor, or a misconfiguration error.
    pub fn executor(&self) -> ApiResult<&Arc<JobExecutor>> {
        self.executor
            .as_ref()
            .map_err(|reason| ApiError::Misconfigured(reason.clone()))
    }
}
