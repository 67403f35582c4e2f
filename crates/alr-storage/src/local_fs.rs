//! Local-filesystem object store.
//!
//! Containers are directories under a root; keys are relative paths
//! inside them. Used for offline runs and tests.

use crate::traits::ObjectStore;
use alr_core::error::{RelayError, Result};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    /// Create a store rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map `container/key` to a path under the root.
    ///
    /// Returns `None` for keys that would escape their container.
    pub fn object_path(&self, container: &str, key: &str) -> Option<PathBuf> {
        let rel = Path::new(key.trim_start_matches('/'));
        let escapes = rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if container.is_empty()
            || container.contains('/')
            || escapes
            || rel.as_os_str().is_empty()
        {
            return None;
        }
        Some(self.root.join(container).join(rel))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn fetch(&self, container: &str, key: &str, dest: &Path) -> Result<u64> {
        let fail = |reason: String| RelayError::Fetch {
            key: format!("{container}/{key}"),
            reason,
        };
        let src = self
            .object_path(container, key)
            .ok_or_else(|| fail("key is not a valid object path".into()))?;
        fs::copy(&src, dest)
            .await
            .map_err(|e| fail(format!("copy {}: {e}", src.display())))
    }

    async fn store(&self, container: &str, key: &str, src: &Path) -> Result<()> {
        let fail = |reason: String| RelayError::Publish {
            key: format!("{container}/{key}"),
            reason,
        };
        let dest = self
            .object_path(container, key)
            .ok_or_else(|| fail("key is not a valid object path".into()))?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| fail(format!("mkdir {}: {e}", parent.display())))?;
        }
        fs::copy(src, &dest)
            .await
            .map_err(|e| fail(format!("copy {}: {e}", src.display())))?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "local"
    }
}
