use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::Url;

pub const VERSION_ENV: &str = "MAIN_SERVICE_VERSION";
pub const AUX_URL_ENV: &str = "AUX_SERVICE_URL";
pub const BIND_ENV: &str = "MAIN__BIND_ADDRESS";
pub const TIMEOUT_ENV: &str = "AUX_SERVICE_TIMEOUT_SECS";

const DEFAULT_VERSION: &str = "v0.0.0";
const DEFAULT_AUX_URL: &str = "http://localhost:8001";
const DEFAULT_BIND: &str = "0.0.0.0:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub http_addr: SocketAddr,
    pub service_version: String,
    pub aux_url: Url,
    pub aux_timeout: Duration,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration through `lookup`; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let http_addr = parse_addr(&read(BIND_ENV).unwrap_or_else(|| DEFAULT_BIND.into()))?;
        let aux_url = parse_aux_url(&read(AUX_URL_ENV).unwrap_or_else(|| DEFAULT_AUX_URL.into()))
            .with_context(|| format!("invalid {AUX_URL_ENV}"))?;
        let aux_timeout = match read(TIMEOUT_ENV) {
            Some(raw) => parse_timeout(&raw).with_context(|| format!("invalid {TIMEOUT_ENV}"))?,
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            http_addr,
            service_version: read(VERSION_ENV).unwrap_or_else(|| DEFAULT_VERSION.into()),
            aux_url,
            aux_timeout,
        })
    }
}

pub fn parse_addr(raw: &str) -> Result<SocketAddr> {
    raw.trim()
        .parse()
        .with_context(|| format!("invalid bind address `{raw}`"))
}

/// Accepts absolute http(s) URLs only; a path prefix is kept.
pub fn parse_aux_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("`{raw}` is not a valid url"))?;
    match url.scheme() {
        "http" | "https" => {}
        other => bail!("unsupported scheme `{other}` in `{raw}`"),
    }
    if url.cannot_be_a_base() || url.host_str().is_none() {
        bail!("`{raw}` cannot be used as a base url");
    }
    Ok(url)
}

fn parse_timeout(raw: &str) -> Result<Duration> {
    let secs: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("`{raw}` is not a whole number of seconds"))?;
    if secs == 0 {
        bail!("timeout must be at least one second");
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = ApiConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.http_addr, "0.0.0.0:8000".parse().unwrap());
        assert_eq!(config.service_version, "v0.0.0");
        assert_eq!(config.aux_url.as_str(), "http://localhost:8001/");
        assert_eq!(config.aux_timeout, Duration::from_secs(10));
    }

    #[test]
    fn reads_overrides() {
        let config = ApiConfig::from_lookup(lookup(&[
            (VERSION_ENV, "v3.0.1"),
            (AUX_URL_ENV, "https://aux.internal:9443/relay"),
            (BIND_ENV, "127.0.0.1:9000"),
            (TIMEOUT_ENV, "2"),
        ]))
        .unwrap();
        assert_eq!(config.service_version, "v3.0.1");
        assert_eq!(config.aux_url.host_str(), Some("aux.internal"));
        assert_eq!(config.aux_url.path(), "/relay");
        assert_eq!(config.http_addr.port(), 9000);
        assert_eq!(config.aux_timeout, Duration::from_secs(2));
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(ApiConfig::from_lookup(lookup(&[(AUX_URL_ENV, "localhost:8001")])).is_err());
        assert!(ApiConfig::from_lookup(lookup(&[(AUX_URL_ENV, "ftp://aux")])).is_err());
        assert!(ApiConfig::from_lookup(lookup(&[(BIND_ENV, "8000")])).is_err());
        assert!(ApiConfig::from_lookup(lookup(&[(TIMEOUT_ENV, "-1")])).is_err());
    }
}
