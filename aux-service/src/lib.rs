//! Internal service that reads object storage and parameter store data from
//! the cloud provider and returns it inside a versioned envelope.

pub mod config;
pub mod error;
pub mod http;
pub mod provider;
pub mod state;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

pub use config::AuxConfig;
pub use state::AppState;

pub async fn run(config: AuxConfig) -> anyhow::Result<()> {
    let state = build_state(&config).await?;

    let listener = TcpListener::bind(config.http_addr)
        .await
        .with_context(|| format!("failed to bind http listener on {}", config.http_addr))?;
    let http_addr = listener.local_addr()?;
    info!(
        %http_addr,
        provider = state.provider.name(),
        version = %state.service_version,
        "aux service listening"
    );

    axum::serve(listener, http::router(state))
        .with_graceful_shutdown(relay_core::shutdown::signal())
        .await
        .context("aux service terminated unexpectedly")?;

    info!("aux service stopped");
    Ok(())
}

pub async fn build_state(config: &AuxConfig) -> anyhow::Result<AppState> {
    let provider = config::load_provider(config).await?;
    Ok(AppState::new(config.service_version.clone(), provider))
}
