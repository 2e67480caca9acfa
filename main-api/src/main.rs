use std::process;

use anyhow::Context;
use clap::Parser;
use main_api::ApiConfig;
use main_api::config::{parse_addr, parse_aux_url};

#[derive(Parser)]
#[command(
    name = "main-api",
    version,
    about = "Public API relaying cloud reads through the auxiliary service"
)]
struct ApiArgs {
    /// Override bind address
    #[arg(long)]
    bind: Option<String>,
    /// Override auxiliary service base URL
    #[arg(long)]
    aux_url: Option<String>,
    /// Verbose output
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    if let Err(err) = real_main().await {
        eprintln!("main api exited with error: {err:#}");
        process::exit(1);
    }
}

async fn real_main() -> anyhow::Result<()> {
    let args = ApiArgs::parse();
    relay_core::telemetry::init(args.verbose)?;
    let mut config = ApiConfig::from_env().context("failed to load configuration")?;

    if let Some(bind) = args.bind.as_deref() {
        config.http_addr = parse_addr(bind)?;
    }
    if let Some(aux_url) = args.aux_url.as_deref() {
        config.aux_url = parse_aux_url(aux_url)?;
    }
    if args.verbose {
        println!(
            "config loaded (bind={}, aux_url={}, timeout={:?}, version={})",
            config.http_addr, config.aux_url, config.aux_timeout, config.service_version
        );
    }

    main_api::run(config).await
}
