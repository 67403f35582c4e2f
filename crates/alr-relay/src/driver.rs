//! Relay driver: fetch → transform → publish for one source object.

use alr_core::{FilenameConvention, RelayConfig, RelayError, Result};
use alr_pipeline::TransformPipeline;
use alr_storage::{ObjectStore, ScratchDir};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::task;
use tokio::time::{timeout_at, Instant};
use tracing::{error, info, info_span, Instrument, Span};
use uuid::Uuid;

/// What one successful invocation produced.
#[derive(Debug, Clone, Serialize)]
pub struct RelayOutcome {
    pub run_id: String,
    pub source_key: String,
    pub destination_key: String,
    pub frames: usize,
    pub records: usize,
}

pub struct Relay {
    config: RelayConfig,
    source: Arc<dyn ObjectStore>,
    destination: Arc<dyn ObjectStore>,
    pipeline: Arc<TransformPipeline>,
    convention: FilenameConvention,
}

impl Relay {
    pub fn new(
        config: RelayConfig,
        source: Arc<dyn ObjectStore>,
        destination: Arc<dyn ObjectStore>,
    ) -> Self {
        let pipeline = Arc::new(TransformPipeline::new(config.compression));
        Self {
            config,
            source,
            destination,
            pipeline,
            convention: FilenameConvention::default(),
        }
    }

    pub fn with_convention(mut self, convention: FilenameConvention) -> Self {
        self.convention = convention;
        self
    }

    pub fn with_pipeline(mut self, pipeline: TransformPipeline) -> Self {
        self.pipeline = Arc::new(pipeline);
        self
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Process one source object end to end.
    ///
    /// The deadline covers the fetch and the publish; the transform itself
    /// always runs to completion or failure, on the blocking pool.
    pub async fn process(&self, key: &str) -> Result<RelayOutcome> {
        let run_id = Uuid::new_v4().to_string();
        let span = info_span!("relay", run_id = %run_id, key);
        async {
            info!(
                source = self.source.name(),
                destination = self.destination.name(),
                "relay started"
            );
            let scratch = ScratchDir::new(&self.config.scratch_prefix)?;
            let result = self.run(&scratch, run_id.clone(), key).await;
            scratch.close();

            match &result {
                Ok(outcome) => info!(
                    destination_key = %outcome.destination_key,
                    frames = outcome.frames,
                    records = outcome.records,
                    "relay finished"
                ),
                Err(e) => error!(kind = e.kind(), error = %e, "relay failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run(&self, scratch: &ScratchDir, run_id: String, key: &str) -> Result<RelayOutcome> {
        let deadline = Instant::now() + self.config.deadline();
        let local = scratch.local_path(key)?;

        let bytes = within(
            deadline,
            self.source.fetch(&self.config.source_bucket, key, &local),
            || RelayError::Fetch {
                key: key.to_string(),
                reason: "deadline exceeded".into(),
            },
        )
        .await?;
        info!(bucket = %self.config.source_bucket, bytes, "fetched source");

        let pipeline = Arc::clone(&self.pipeline);
        let source = local.clone();
        let span = Span::current();
        let outcome = task::spawn_blocking(move || {
            span.in_scope(|| pipeline.transform_file(&source))
        })
        .await
        .map_err(|e| RelayError::Other(e.into()))??;

        let partition = self.convention.parse(&local)?;
        let destination_key = partition.object_key(&outcome.sink_path);
        let bucket = &self.config.destination_bucket;
        within(
            deadline,
            self.destination.store(bucket, &destination_key, &outcome.sink_path),
            || RelayError::Publish {
                key: destination_key.clone(),
                reason: "deadline exceeded".into(),
            },
        )
        .await?;
        info!(bucket = %bucket, key = %destination_key, "published records");

        Ok(RelayOutcome {
            run_id,
            source_key: key.to_string(),
            destination_key,
            frames: outcome.stats.frames,
            records: outcome.stats.records(),
        })
    }
}

async fn within<T, F>(deadline: Instant, fut: F, expired: impl FnOnce() -> RelayError) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout_at(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(expired()),
    }
}
