//! Scoped working directories.
//!
//! Each job gets its own directory under the work root. Cleanup is best
//! effort: failures are logged and never propagated.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};

use crate::error::MediaResult;

/// A per-job working directory.
#[derive(Debug, Clone)]
pub struct WorkDir {
    path: PathBuf,
}

impl WorkDir {
    /// Create `<root>/<name>` (and any missing parents).
    pub async fn create(root: impl AsRef<Path>, name: &str) -> MediaResult<Self> {
        let path = root.as_ref().join(name);
        fs::create_dir_all(&path).await?;
        debug!("Created work dir {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the directory and everything in it.
    pub async fn cleanup(&self) {
        match fs::remove_dir_all(&self.path).await {
            Ok(()) => debug!("Removed work dir {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to remove work dir {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

/// Remove a single file, logging instead of failing.
pub async fn remove_file_logged(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => debug!("Removed {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
    }
}
