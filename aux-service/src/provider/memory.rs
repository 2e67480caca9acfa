use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use relay_core::Parameter;
use serde::Deserialize;

use super::{CloudProvider, ProviderError, ProviderResult};

/// Provider backed by fixed data, for local runs and tests.
#[derive(Clone, Debug, Default)]
pub struct MemoryProvider {
    buckets: Vec<String>,
    parameters: BTreeMap<String, Parameter>,
    failure: Option<ProviderError>,
}

#[derive(Deserialize)]
struct Fixture {
    #[serde(default)]
    buckets: Vec<String>,
    #[serde(default)]
    parameters: Vec<Parameter>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load buckets and parameters from a JSON fixture of the form
    /// `{"buckets": [...], "parameters": [{"name", "type", "arn", "value"}]}`.
    pub fn from_fixture(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read fixture {}", path.display()))?;
        let fixture: Fixture = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse fixture {}", path.display()))?;
        Ok(fixture
            .parameters
            .into_iter()
            .fold(Self::new().with_buckets(fixture.buckets), |provider, parameter| {
                provider.with_parameter(parameter)
            }))
    }

    pub fn with_bucket(mut self, name: impl Into<String>) -> Self {
        self.buckets.push(name.into());
        self
    }

    pub fn with_buckets<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.buckets.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.insert(parameter.name.clone(), parameter);
        self
    }

    /// Make every call fail with `error`.
    pub fn failing(mut self, error: ProviderError) -> Self {
        self.failure = Some(error);
        self
    }

    fn check(&self) -> ProviderResult<()> {
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CloudProvider for MemoryProvider {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn list_buckets(&self) -> ProviderResult<Vec<String>> {
        self.check()?;
        Ok(self.buckets.clone())
    }

    async fn list_parameters(&self) -> ProviderResult<Vec<Parameter>> {
        self.check()?;
        Ok(self
            .parameters
            .values()
            .map(|parameter| Parameter {
                value: None,
                ..parameter.clone()
            })
            .collect())
    }

    async fn get_parameter(&self, name: &str) -> ProviderResult<Parameter> {
        self.check()?;
        self.parameters
            .get(name)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::ParameterType;
    use std::io::Write;

    fn parameter(name: &str, value: &str) -> Parameter {
        Parameter {
            name: name.into(),
            kind: ParameterType::String,
            arn: format!("arn:aws:ssm:us-east-1:000000000000:parameter/{name}"),
            value: Some(value.into()),
        }
    }

    #[tokio::test]
    async fn listing_hides_values() {
        let provider = MemoryProvider::new().with_parameter(parameter("feature", "on"));
        let listed = provider.list_parameters().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].value, None);

        let fetched = provider.get_parameter("feature").await.unwrap();
        assert_eq!(fetched.value.as_deref(), Some("on"));
    }

    #[tokio::test]
    async fn missing_parameter_is_not_found() {
        let provider = MemoryProvider::new();
        let err = provider.get_parameter("nope").await.unwrap_err();
        assert_eq!(err, ProviderError::NotFound("nope".into()));
    }

    #[tokio::test]
    async fn forced_failure_applies_to_every_call() {
        let provider = MemoryProvider::new()
            .with_bucket("a")
            .failing(ProviderError::Upstream("AccessDenied".into()));
        assert!(provider.list_buckets().await.is_err());
        assert!(provider.list_parameters().await.is_err());
        assert!(provider.get_parameter("a").await.is_err());
    }

    #[tokio::test]
    async fn loads_fixture_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "buckets": ["logs", "assets"],
                "parameters": [
                    {{"name": "app/token", "type": "SecureString", "value": "s3cr3t"}}
                ]
            }}"#
        )
        .unwrap();

        let provider = MemoryProvider::from_fixture(file.path()).unwrap();
        assert_eq!(provider.list_buckets().await.unwrap(), vec!["logs", "assets"]);
        let token = provider.get_parameter("app/token").await.unwrap();
        assert_eq!(token.kind, ParameterType::SecureString);
        assert_eq!(token.arn, "");
        assert_eq!(token.value.as_deref(), Some("s3cr3t"));
    }

    #[test]
    fn rejects_malformed_fixture() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{\"buckets\": 3}}").unwrap();
        assert!(MemoryProvider::from_fixture(file.path()).is_err());
    }
}
