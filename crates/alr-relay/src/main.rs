//! `alr-relay` binary.

use alr_relay::cli::{Cli, Commands};
use alr_relay::Relay;
use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config();
    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "invalid configuration");
        std::process::exit(1);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let (source, destination) = cli.stores(&config).await;
        let relay = Arc::new(Relay::new(config, source, destination));
        match cli.command {
            Commands::Run(args) => {
                relay.process(&args.key).await?;
                anyhow::Ok(())
            }
            Commands::Serve(args) => alr_relay::serve(relay, args.listen).await,
        }
    })
}
