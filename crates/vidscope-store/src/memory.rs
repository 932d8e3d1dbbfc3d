//! In-process job store.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use vidscope_models::{Job, JobId};

use crate::error::StoreResult;
use crate::store::JobStore;

#[derive(Debug, Clone)]
struct Entry {
    job: Job,
    /// `None` when the TTL runs past what `Instant` can represent
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Job store backed by a map behind an async `RwLock`.
///
/// Expired entries are never returned. They are dropped on the next write
/// or by an explicit `purge_expired` call.
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    entries: RwLock<HashMap<JobId, Entry>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired entry. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        Self::purge_locked(&mut entries, Instant::now())
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|e| !e.is_expired(now))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn purge_locked(entries: &mut HashMap<JobId, Entry>, now: Instant) -> usize {
        let before = entries.len();
        entries.retain(|_, e| !e.is_expired(now));
        let removed = before - entries.len();
        if removed > 0 {
            debug!("Purged {} expired job records", removed);
        }
        removed
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn get(&self, id: &JobId) -> StoreResult<Option<Job>> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(entries
            .get(id)
            .filter(|e| !e.is_expired(now))
            .map(|e| e.job.clone()))
    }

    async fn set(&self, id: &JobId, job: &Job, ttl: Duration) -> StoreResult<()> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        Self::purge_locked(&mut entries, now);
        entries.insert(
            id.clone(),
            Entry {
                job: job.clone(),
                expires_at: now.checked_add(ttl),
            },
        );
        Ok(())
    }

    async fn delete(&self, id: &JobId) -> StoreResult<()> {
        self.entries.write().await.remove(id);
        Ok(())
    }

    async fn purge_expired(&self) -> StoreResult<usize> {
        Ok(MemoryJobStore::purge_expired(self).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidscope_models::JobStatus;

    const HOUR: Duration = Duration::from_secs(3600);

    #[tokio::test]
    async fn test_set_and_get() {
        let store = MemoryJobStore::new();
        let job = Job::new();

        store.set(&job.id, &job, HOUR).await.unwrap();
        let fetched = store.get(&job.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, job.id);
        assert_eq!(fetched.status, JobStatus::Queued);
    }

    #[tokio::test]
    async fn test_unknown_is_none() {
        let store = MemoryJobStore::new();
        assert!(store.get(&JobId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_overwrite() {
        let store = MemoryJobStore::new();
        let mut job = Job::new();
        store.set(&job.id, &job, HOUR).await.unwrap();

        job.start();
        job.set_progress(30);
        store.set(&job.id, &job, HOUR).await.unwrap();

        let fetched = store.get(&job.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, JobStatus::Processing);
        assert_eq!(fetched.progress, 30);
    }

    #[tokio::test]
    async fn test_expired_entry_is_hidden_and_purged() {
        let store = MemoryJobStore::new();
        let job = Job::new();
        store
            .set(&job.id, &job, Duration::from_millis(20))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(60)).await;

        assert!(store.get(&job.id).await.unwrap().is_none());
        assert!(store.is_empty().await);
        assert_eq!(store.purge_expired().await, 1);
        assert_eq!(store.purge_expired().await, 0);
    }

    #[tokio::test]
    async fn test_write_restarts_ttl() {
        let store = MemoryJobStore::new();
        let job = Job::new();
        store
            .set(&job.id, &job, Duration::from_millis(20))
            .await
            .unwrap();
        store.set(&job.id, &job, HOUR).await.unwrap();

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(store.get(&job.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_write_purges_other_expired_entries() {
        let store = MemoryJobStore::new();
        let stale = Job::new();
        store
            .set(&stale.id, &stale, Duration::from_millis(10))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;

        let fresh = Job::new();
        store.set(&fresh.id, &fresh, HOUR).await.unwrap();

        assert_eq!(store.entries.read().await.len(), 1);
    }

    #[tokio::test]
    async fn test_huge_ttl_does_not_overflow() {
        let store = MemoryJobStore::new();
        let job = Job::new();
        store
            .set(&job.id, &job, Duration::from_secs(u64::MAX / 2))
            .await
            .unwrap();
        store.set(&job.id, &job, Duration::MAX).await.unwrap();

        assert!(store.get(&job.id).await.unwrap().is_some());
        assert_eq!(store.purge_expired().await, 0);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryJobStore::new();
        let job = Job::new();
        store.set(&job.id, &job, HOUR).await.unwrap();
        store.delete(&job.id).await.unwrap();
        assert!(store.get(&job.id).await.unwrap().is_none());

        // Deleting again is fine.
        store.delete(&job.id).await.unwrap();
    }
}
