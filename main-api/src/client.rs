use std::time::Duration;

use axum::body::Bytes;
use relay_core::telemetry::{CORRELATION_ID_HEADER, CorrelationId};
use relay_core::UpstreamEnvelope;
use reqwest::{StatusCode, Url};
use thiserror::Error;
use tracing::debug;

const BUCKETS_PATH: [&str; 3] = ["aws", "s3", "buckets"];
const PARAMETERS_PATH: [&str; 3] = ["aws", "ssm", "parameters"];
const PARAMETER_PATH: [&str; 3] = ["aws", "ssm", "parameter"];

#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a complete response: refused connection,
    /// DNS failure or timeout.
    #[error("auxiliary service unreachable at {endpoint}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("auxiliary service at {endpoint} returned {status}")]
    Status {
        endpoint: String,
        status: StatusCode,
        body: Bytes,
    },
    #[error("invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },
    /// `.` and `..` segments are resolved away by URL normalization, so
    /// such a name cannot reach the auxiliary service as written.
    #[error("parameter name `{0}` contains a relative path segment")]
    RelativeName(String),
    #[error("cannot build request url from {0}")]
    InvalidUrl(String),
    #[error("failed to build http client")]
    Build(#[source] reqwest::Error),
}

/// HTTP client for the auxiliary service.
#[derive(Clone, Debug)]
pub struct AuxClient {
    base_url: Url,
    client: reqwest::Client,
    timeout: Duration,
}

impl AuxClient {
    pub fn new(base_url: Url) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("main-api/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ClientError::Build)?;
        Ok(Self {
            base_url,
            client,
            timeout: Duration::from_secs(10),
        })
    }

    /// Override the request timeout (default 10 seconds).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn list_buckets(
        &self,
        correlation: &CorrelationId,
    ) -> Result<UpstreamEnvelope, ClientError> {
        let url = self.endpoint(BUCKETS_PATH)?;
        self.fetch(url, correlation).await
    }

    pub async fn list_parameters(
        &self,
        correlation: &CorrelationId,
    ) -> Result<UpstreamEnvelope, ClientError> {
        let url = self.endpoint(PARAMETERS_PATH)?;
        self.fetch(url, correlation).await
    }

    /// Fetch one parameter. `/` inside `name` is kept as a path separator;
    /// every segment is percent-encoded on its own.
    pub async fn get_parameter(
        &self,
        name: &str,
        correlation: &CorrelationId,
    ) -> Result<UpstreamEnvelope, ClientError> {
        let url = self.parameter_endpoint(name)?;
        self.fetch(url, correlation).await
    }

    fn parameter_endpoint(&self, name: &str) -> Result<Url, ClientError> {
        if name.split('/').any(|segment| matches!(segment, "." | "..")) {
            return Err(ClientError::RelativeName(name.to_string()));
        }
        self.endpoint(PARAMETER_PATH.into_iter().chain(name.split('/')))
    }

    pub fn endpoint<'a, I>(&self, segments: I) -> Result<Url, ClientError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn fetch(
        &self,
        url: Url,
        correlation: &CorrelationId,
    ) -> Result<UpstreamEnvelope, ClientError> {
        let endpoint = url.to_string();
        debug!(%endpoint, "calling auxiliary service");

        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .header(CORRELATION_ID_HEADER, correlation.as_str())
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                endpoint: endpoint.clone(),
                source,
            })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|source| ClientError::Transport {
                endpoint: endpoint.clone(),
                source,
            })?;

        if !status.is_success() {
            return Err(ClientError::Status {
                endpoint,
                status,
                body,
            });
        }

        serde_json::from_slice(&body).map_err(|err| ClientError::InvalidResponse {
            endpoint,
            reason: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> AuxClient {
        AuxClient::new(Url::parse(base).unwrap()).unwrap()
    }

    #[test]
    fn joins_fixed_paths_onto_root() {
        let url = client("http://localhost:8001").endpoint(BUCKETS_PATH).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8001/aws/s3/buckets");
    }

    #[test]
    fn keeps_base_path_prefix() {
        let url = client("http://aux.internal/relay/")
            .endpoint(PARAMETERS_PATH)
            .unwrap();
        assert_eq!(url.as_str(), "http://aux.internal/relay/aws/ssm/parameters");
    }

    #[test]
    fn encodes_each_parameter_segment() {
        let url = client("http://localhost:8001")
            .parameter_endpoint("app/db pass?x")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8001/aws/ssm/parameter/app/db%20pass%3Fx"
        );
    }

    #[test]
    fn dotted_names_are_not_relative() {
        let url = client("http://localhost:8001")
            .parameter_endpoint("app/.env/v1.2")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8001/aws/ssm/parameter/app/.env/v1.2"
        );
    }

    #[test]
    fn relative_segments_are_rejected() {
        let aux = client("http://localhost:8001");
        for name in ["app/./prod", "app/staging/../prod", "..", "."] {
            let err = aux.parameter_endpoint(name).unwrap_err();
            assert!(
                matches!(&err, ClientError::RelativeName(rejected) if rejected == name),
                "{name}: {err}"
            );
        }
    }
}
