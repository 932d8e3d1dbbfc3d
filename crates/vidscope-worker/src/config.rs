//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

use vidscope_store::{DEFAULT_JOB_TTL_SECS, MAX_JOB_TTL_SECS};

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Root for uploads and per-job frame directories
    pub work_dir: PathBuf,
    /// Expiry applied to every job record write
    pub job_ttl: Duration,
    /// Kill FFmpeg after this many seconds; `None` waits indefinitely
    pub ffmpeg_timeout_secs: Option<u64>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            work_dir: std::env::temp_dir().join("vidscope"),
            job_ttl: Duration::from_secs(DEFAULT_JOB_TTL_SECS),
            ffmpeg_timeout_secs: None,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            work_dir: std::env::var("WORKER_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            job_ttl: std::env::var("JOB_TTL_SECS")
                .ok()
                .and_then(|s| parse_ttl(&s))
                .unwrap_or(defaults.job_ttl),
            ffmpeg_timeout_secs: std::env::var("FFMPEG_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok()),
        }
    }

    /// Work config rooted at `work_dir`, other fields defaulted.
    pub fn with_work_dir(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            ..Self::default()
        }
    }

    /// Directory holding raw uploads.
    pub fn uploads_dir(&self) -> PathBuf {
        self.work_dir.join("uploads")
    }

    /// Directory holding per-job frame directories.
    pub fn frames_dir(&self) -> PathBuf {
        self.work_dir.join("frames")
    }
}

/// Positive whole seconds, capped at `MAX_JOB_TTL_SECS`.
fn parse_ttl(value: &str) -> Option<Duration> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|secs| *secs > 0)
        .map(|secs| Duration::from_secs(secs.min(MAX_JOB_TTL_SECS)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let config = WorkerConfig::with_work_dir("/srv/vidscope");
        assert_eq!(config.uploads_dir(), PathBuf::from("/srv/vidscope/uploads"));
        assert_eq!(config.frames_dir(), PathBuf::from("/srv/vidscope/frames"));
        assert_eq!(config.job_ttl, Duration::from_secs(3600));
        assert!(config.ffmpeg_timeout_secs.is_none());
    }

    #[test]
    fn test_parse_ttl() {
        assert_eq!(parse_ttl("90"), Some(Duration::from_secs(90)));
        assert_eq!(parse_ttl("0"), None);
        assert_eq!(parse_ttl("soon"), None);
        assert_eq!(
            parse_ttl("18446744073709551615"),
            Some(Duration::from_secs(MAX_JOB_TTL_SECS))
        );
    }
}
