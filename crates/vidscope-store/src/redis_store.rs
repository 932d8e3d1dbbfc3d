//! Redis-backed job store.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::debug;

use vidscope_models::{Job, JobId};

use crate::config::MAX_JOB_TTL_SECS;
use crate::error::StoreResult;
use crate::store::JobStore;

const KEY_PREFIX: &str = "vidscope:job:";

/// Job store keeping each job as a JSON string with a Redis expiry.
pub struct RedisJobStore {
    client: redis::Client,
}

impl RedisJobStore {
    /// Create a new store. Connections are opened lazily per call.
    pub fn new(redis_url: &str) -> StoreResult<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client })
    }

    /// Redis key for a job.
    pub fn key(id: &JobId) -> String {
        format!("{}{}", KEY_PREFIX, id)
    }
}

/// Redis expiries are whole seconds; never round down to zero.
fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().clamp(1, MAX_JOB_TTL_SECS)
}

#[async_trait]
impl JobStore for RedisJobStore {
    async fn get(&self, id: &JobId) -> StoreResult<Option<Job>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload: Option<String> = conn.get(Self::key(id)).await?;
        match payload {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, id: &JobId, job: &Job, ttl: Duration) -> StoreResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload = serde_json::to_string(job)?;
        let key = Self::key(id);

        debug!("Writing job record {} ({} bytes)", key, payload.len());
        conn.set_ex::<_, _, ()>(&key, payload, ttl_secs(ttl)).await?;
        Ok(())
    }

    async fn delete(&self, id: &JobId) -> StoreResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.del::<_, ()>(Self::key(id)).await?;
        Ok(())
    }
}
