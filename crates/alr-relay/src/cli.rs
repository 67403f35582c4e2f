//! Command-line and environment configuration.
//!
//! Every flag falls back to an environment variable, so the same binary
//! works from a shell and from a container or function runtime:
//!
//! - `SRC_BUCKET`, `DST_BUCKET` - source and destination containers
//! - `AWS_REGION` - storage region
//! - `AWS_ENDPOINT_URL` - custom S3 endpoint (optional)
//! - `ALR_LOCAL_ROOT` - use a local directory tree instead of S3 (optional)
//! - `SRC_KEY` - object key for `run`
//! - `ALR_LISTEN` - listen address for `serve`

use alr_core::{Compression, RelayConfig};
use alr_storage::{LocalObjectStore, ObjectStore, S3ObjectStore};
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

/// Relay compressed audit log deliveries into partitioned JSON Lines.
#[derive(Debug, Parser)]
#[command(name = "alr-relay")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Source bucket holding the compressed deliveries.
    #[arg(short = 's', long, env = "SRC_BUCKET")]
    pub src_bucket: String,

    /// Destination bucket for the JSON Lines output.
    #[arg(short = 'd', long, env = "DST_BUCKET")]
    pub dst_bucket: String,

    /// Storage region.
    #[arg(short = 'r', long, env = "AWS_REGION")]
    pub region: String,

    /// Custom S3 endpoint.
    #[arg(long, env = "AWS_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,

    /// Serve buckets from directories under this root instead of S3.
    #[arg(long, env = "ALR_LOCAL_ROOT")]
    pub local_root: Option<PathBuf>,

    /// Source framing: gzip or none.
    #[arg(long, default_value = "gzip")]
    pub compression: Compression,

    /// Time budget for the fetch and publish steps, in seconds.
    #[arg(long, default_value_t = 120)]
    pub deadline_secs: u64,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Relay one source object and exit.
    Run(RunArgs),
    /// Serve the HTTP invocation endpoint.
    Serve(ServeArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Source object key.
    #[arg(short = 'f', long = "file", env = "SRC_KEY")]
    pub key: String,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address to listen on.
    #[arg(long, env = "ALR_LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,
}

impl Cli {
    /// Resolve the relay configuration.
    pub fn config(&self) -> RelayConfig {
        RelayConfig {
            endpoint_url: self.endpoint_url.clone(),
            compression: self.compression,
            deadline_secs: self.deadline_secs,
            ..RelayConfig::new(&self.src_bucket, &self.dst_bucket, &self.region)
        }
    }

    /// Source and destination stores for this configuration.
    pub async fn stores(
        &self,
        config: &RelayConfig,
    ) -> (Arc<dyn ObjectStore>, Arc<dyn ObjectStore>) {
        let store: Arc<dyn ObjectStore> = match &self.local_root {
            Some(root) => Arc::new(LocalObjectStore::new(root.clone())),
            None => {
                let endpoint = config.endpoint_url.as_deref();
                Arc::new(S3ObjectStore::connect(&config.region, endpoint).await)
            }
        };
        (store.clone(), store)
    }
}
