use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::ValueEnum;

use crate::provider::{MemoryProvider, SharedProvider};

pub const VERSION_ENV: &str = "AUX_SERVICE_VERSION";
pub const REGION_ENV: &str = "AWS_REGION";
pub const BIND_ENV: &str = "AUX__BIND_ADDRESS";
pub const PROVIDER_ENV: &str = "AUX_PROVIDER";
pub const TIMEOUT_ENV: &str = "AUX_PROVIDER_TIMEOUT_SECS";
pub const S3_ENDPOINT_ENV: &str = "AUX_S3_ENDPOINT";
pub const SSM_ENDPOINT_ENV: &str = "AUX_SSM_ENDPOINT";
pub const FIXTURE_ENV: &str = "AUX_MEMORY_FIXTURE";

const DEFAULT_VERSION: &str = "v0.0.0";
const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_BIND: &str = "0.0.0.0:8001";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProviderKind {
    Aws,
    Memory,
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "aws" => Ok(ProviderKind::Aws),
            "memory" => Ok(ProviderKind::Memory),
            other => Err(anyhow!("unsupported provider `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsSettings {
    pub region: String,
    pub timeout: Duration,
    pub s3_endpoint: Option<String>,
    pub ssm_endpoint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AuxConfig {
    pub http_addr: SocketAddr,
    pub service_version: String,
    pub provider: ProviderKind,
    pub aws: AwsSettings,
    pub memory_fixture: Option<PathBuf>,
}

impl AuxConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration through `lookup`; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let bind = read(BIND_ENV).unwrap_or_else(|| DEFAULT_BIND.into());
        let http_addr = parse_addr(&bind)?;
        let provider = match read(PROVIDER_ENV) {
            Some(kind) => kind.parse().with_context(|| format!("invalid {PROVIDER_ENV}"))?,
            None => ProviderKind::Aws,
        };
        let timeout = match read(TIMEOUT_ENV) {
            Some(raw) => parse_timeout(&raw).with_context(|| format!("invalid {TIMEOUT_ENV}"))?,
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            http_addr,
            service_version: read(VERSION_ENV).unwrap_or_else(|| DEFAULT_VERSION.into()),
            provider,
            aws: AwsSettings {
                region: read(REGION_ENV).unwrap_or_else(|| DEFAULT_REGION.into()),
                timeout,
                s3_endpoint: read(S3_ENDPOINT_ENV),
                ssm_endpoint: read(SSM_ENDPOINT_ENV),
            },
            memory_fixture: read(FIXTURE_ENV).map(PathBuf::from),
        })
    }
}

pub fn parse_addr(raw: &str) -> Result<SocketAddr> {
    raw.trim()
        .parse()
        .with_context(|| format!("invalid bind address `{raw}`"))
}

fn parse_timeout(raw: &str) -> Result<Duration> {
    let secs: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("`{raw}` is not a whole number of seconds"))?;
    if secs == 0 {
        anyhow::bail!("timeout must be at least one second");
    }
    Ok(Duration::from_secs(secs))
}

pub async fn load_provider(config: &AuxConfig) -> Result<SharedProvider> {
    match config.provider {
        ProviderKind::Memory => memory_provider(config),
        ProviderKind::Aws => {
            #[cfg(feature = "aws")]
            {
                Ok(aws_provider(&config.aws).await)
            }

            #[cfg(not(feature = "aws"))]
            {
                anyhow::bail!("aws provider requested but aws feature is not enabled");
            }
        }
    }
}

fn memory_provider(config: &AuxConfig) -> Result<SharedProvider> {
    let provider = match &config.memory_fixture {
        Some(path) => MemoryProvider::from_fixture(path)
            .context("failed to configure memory provider")?,
        None => MemoryProvider::new(),
    };
    Ok(Arc::new(provider))
}

#[cfg(feature = "aws")]
async fn aws_provider(settings: &AwsSettings) -> SharedProvider {
    Arc::new(crate::provider::aws::AwsProvider::from_settings(settings).await)
}
