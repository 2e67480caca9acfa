//! Public API. Every route is a single call to the auxiliary service whose
//! envelope is reshaped to carry this service's version as well.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod state;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

pub use client::AuxClient;
pub use config::ApiConfig;
pub use state::AppState;

pub async fn run(config: ApiConfig) -> anyhow::Result<()> {
    let state = build_state(&config)?;

    let listener = TcpListener::bind(config.http_addr)
        .await
        .with_context(|| format!("failed to bind http listener on {}", config.http_addr))?;
    let http_addr = listener.local_addr()?;
    info!(
        %http_addr,
        aux_url = %config.aux_url,
        version = %state.main_api_version,
        "main api listening"
    );

    axum::serve(listener, http::router(state))
        .with_graceful_shutdown(relay_core::shutdown::signal())
        .await
        .context("main api terminated unexpectedly")?;

    info!("main api stopped");
    Ok(())
}

pub fn build_state(config: &ApiConfig) -> anyhow::Result<AppState> {
    let aux = AuxClient::new(config.aux_url.clone())
        .context("failed to create auxiliary service client")?
        .with_timeout(config.aux_timeout);
    Ok(AppState::new(config.service_version.clone(), aux))
}
