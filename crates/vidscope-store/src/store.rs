//! The job store abstraction.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use vidscope_models::{Job, JobId};

use crate::config::{StoreBackend, StoreConfig};
use crate::error::StoreResult;
use crate::memory::MemoryJobStore;
use crate::redis_store::RedisJobStore;

/// Keyed job records with per-entry expiry.
///
/// One writer per key (the pipeline task that owns the job) and any number
/// of concurrent readers.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Fetch a job; `None` when unknown or expired.
    async fn get(&self, id: &JobId) -> StoreResult<Option<Job>>;

    /// Insert or overwrite a job. The expiry restarts at `ttl` from now.
    async fn set(&self, id: &JobId, job: &Job, ttl: Duration) -> StoreResult<()>;

    /// Remove a job. Removing an unknown id is not an error.
    async fn delete(&self, id: &JobId) -> StoreResult<()>;

    /// Drop expired records. Backends that expire keys on their own
    /// report zero.
    async fn purge_expired(&self) -> StoreResult<usize> {
        Ok(0)
    }
}

/// Build the store selected by `config`.
pub fn build_store(config: &StoreConfig) -> StoreResult<Arc<dyn JobStore>> {
    match config.backend {
        StoreBackend::Memory => {
            info!("Using in-process job store");
            Ok(Arc::new(MemoryJobStore::new()))
        }
        StoreBackend::Redis => {
            info!("Using Redis job store");
            Ok(Arc::new(RedisJobStore::new(&config.redis_url)?))
        }
    }
}
