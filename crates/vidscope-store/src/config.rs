//! Store configuration.

use crate::error::{StoreError, StoreResult};

/// Job records live for an hour after their last write.
pub const DEFAULT_JOB_TTL_SECS: u64 = 3600;

/// Longest accepted record lifetime (30 days).
pub const MAX_JOB_TTL_SECS: u64 = 30 * 24 * 3600;

/// Which backend holds job records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// In-process map; state is lost on restart
    Memory,
    /// Shared Redis instance
    Redis,
}

impl StoreBackend {
    fn parse(value: &str) -> StoreResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            other => Err(StoreError::config(format!(
                "unknown JOB_STORE backend '{}'",
                other
            ))),
        }
    }
}

/// Store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Redis URL, used when `backend` is `Redis`
    pub redis_url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            redis_url: "redis://localhost:6379".to_string(),
        }
    }
}

impl StoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StoreResult<Self> {
        let backend = match std::env::var("JOB_STORE") {
            Ok(value) => StoreBackend::parse(&value)?,
            Err(_) => StoreBackend::Memory,
        };

        Ok(Self {
            backend,
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parse() {
        assert_eq!(StoreBackend::parse("memory").unwrap(), StoreBackend::Memory);
        assert_eq!(StoreBackend::parse("").unwrap(), StoreBackend::Memory);
        assert_eq!(StoreBackend::parse("Redis").unwrap(), StoreBackend::Redis);
        assert!(StoreBackend::parse("dynamo").is_err());
    }

    #[test]
    fn test_default_backend() {
        assert_eq!(StoreConfig::default().backend, StoreBackend::Memory);
    }
}
