//! Per-invocation scratch directory.

use alr_core::error::{RelayError, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

/// Temporary directory holding the downloaded source and its sink.
///
/// Removed on [`ScratchDir::close`], or on drop.
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    pub fn new(prefix: &str) -> Result<Self> {
        let dir = tempfile::Builder::new().prefix(prefix).tempdir()?;
        debug!(path = %dir.path().display(), "created scratch dir");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Local path for an object key: its base name inside the scratch dir.
    pub fn local_path(&self, key: &str) -> Result<PathBuf> {
        let name = Path::new(key)
            .file_name()
            .ok_or_else(|| RelayError::Fetch {
                key: key.to_string(),
                reason: "key has no file name".into(),
            })?;
        Ok(self.dir.path().join(name))
    }

    /// Remove the directory, logging instead of failing.
    pub fn close(self) {
        let path = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            warn!(path = %path.display(), error = %e, "failed to remove scratch dir");
        }
    }
}
