//! Job state storage.
//!
//! This crate provides:
//! - The `JobStore` trait the pipeline and HTTP layer share
//! - An in-process store with per-entry expiry
//! - A Redis-backed store for multi-process deployments

pub mod config;
pub mod error;
pub mod memory;
pub mod redis_store;
pub mod store;

pub use config::{StoreBackend, StoreConfig, DEFAULT_JOB_TTL_SECS, MAX_JOB_TTL_SECS};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryJobStore;
pub use redis_store::RedisJobStore;
pub use store::{build_store, JobStore};
