use std::path::PathBuf;
use std::process;

use anyhow::Context;
use aux_service::AuxConfig;
use aux_service::config::{ProviderKind, parse_addr};
use clap::Parser;

#[derive(Parser)]
#[command(
    name = "aux-service",
    version,
    about = "Serve object storage and parameter store reads over HTTP"
)]
struct AuxArgs {
    /// Override bind address
    #[arg(long)]
    bind: Option<String>,
    /// Override provider backend
    #[arg(long, value_enum)]
    provider: Option<ProviderKind>,
    /// JSON fixture for the memory provider
    #[arg(long)]
    fixture: Option<PathBuf>,
    /// Verbose output
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    if let Err(err) = real_main().await {
        eprintln!("aux service exited with error: {err:#}");
        process::exit(1);
    }
}

async fn real_main() -> anyhow::Result<()> {
    let args = AuxArgs::parse();
    relay_core::telemetry::init(args.verbose)?;
    let mut config = AuxConfig::from_env().context("failed to load configuration")?;

    if let Some(bind) = args.bind.as_deref() {
        config.http_addr = parse_addr(bind)?;
    }
    if let Some(provider) = args.provider {
        config.provider = provider;
    }
    if let Some(fixture) = args.fixture {
        config.memory_fixture = Some(fixture);
    }
    if args.verbose {
        println!(
            "config loaded (bind={}, provider={:?}, region={}, version={})",
            config.http_addr, config.provider, config.aws.region, config.service_version
        );
    }

    aux_service::run(config).await
}
