use alr_core::Result;
use async_trait::async_trait;
use std::path::Path;

/// Durable object storage addressed by container and key.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Download `container/key` into the local file `dest`, returning its size.
    async fn fetch(&self, container: &str, key: &str, dest: &Path) -> Result<u64>;

    /// Upload the local file `src` as `container/key`.
    async fn store(&self, container: &str, key: &str, src: &Path) -> Result<()>;

    /// Backend name, for logs.
    fn name(&self) -> &'static str;
}
