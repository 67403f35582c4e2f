//! S3-backed object store using the AWS SDK credential chain.

use crate::traits::ObjectStore;
use alr_core::error::{RelayError, Result};
use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::path::Path;
use tokio::fs;
use tracing::debug;

pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    /// Build a client for `region`, optionally against a custom endpoint
    /// (path-style addressing is used when an endpoint is given).
    pub async fn connect(region: &str, endpoint_url: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()));
        if let Some(endpoint) = endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if endpoint_url.is_some() {
            builder = builder.force_path_style(true);
        }
        Self {
            client: Client::from_conf(builder.build()),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn fetch(&self, container: &str, key: &str, dest: &Path) -> Result<u64> {
        let fail = |reason: String| RelayError::Fetch {
            key: format!("s3://{container}/{key}"),
            reason,
        };
        let output = self
            .client
            .get_object()
            .bucket(container)
            .key(key)
            .send()
            .await
            .map_err(|e| fail(DisplayErrorContext(&e).to_string()))?;
        let data = output
            .body
            .collect()
            .await
            .map_err(|e| fail(format!("read body: {e}")))?
            .into_bytes();
        fs::write(dest, &data[..])
            .await
            .map_err(|e| fail(format!("write {}: {e}", dest.display())))?;
        debug!(bucket = container, key, bytes = data.len(), "fetched object");
        Ok(data.len() as u64)
    }

    async fn store(&self, container: &str, key: &str, src: &Path) -> Result<()> {
        let fail = |reason: String| RelayError::Publish {
            key: format!("s3://{container}/{key}"),
            reason,
        };
        let body = ByteStream::from_path(src)
            .await
            .map_err(|e| fail(format!("open {}: {e}", src.display())))?;
        self.client
            .put_object()
            .bucket(container)
            .key(key)
            .content_type("application/x-ndjson")
            .body(body)
            .send()
            .await
            .map_err(|e| fail(DisplayErrorContext(&e).to_string()))?;
        debug!(bucket = container, key, "stored object");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "s3"
    }
}
