use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::timeout::TimeoutConfig;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_ssm::Client as SsmClient;
use aws_sdk_ssm::error::{DisplayErrorContext, SdkError};
use aws_sdk_ssm::operation::get_parameter::GetParameterError;
use aws_sdk_ssm::types::ParameterType as SsmParameterType;
use aws_types::region::Region;
use relay_core::{Parameter, ParameterType};
use tracing::debug;

use super::{CloudProvider, ProviderError, ProviderResult};
use crate::config::AwsSettings;

/// S3 and SSM backed provider.
#[derive(Clone, Debug)]
pub struct AwsProvider {
    s3: S3Client,
    ssm: SsmClient,
}

impl AwsProvider {
    pub fn new(s3: S3Client, ssm: SsmClient) -> Self {
        Self { s3, ssm }
    }

    /// Build both clients from the default credential chain, pinned to the
    /// configured region and bounded by the operation timeout.
    pub async fn from_settings(settings: &AwsSettings) -> Self {
        let shared_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(settings.timeout)
                    .build(),
            )
            .load()
            .await;

        let s3 = {
            let mut builder = aws_sdk_s3::config::Builder::from(&shared_config);
            if let Some(endpoint) = settings.s3_endpoint.as_deref() {
                builder = builder.endpoint_url(endpoint).force_path_style(true);
            }
            S3Client::from_conf(builder.build())
        };

        let ssm = {
            let mut builder = aws_sdk_ssm::config::Builder::from(&shared_config);
            if let Some(endpoint) = settings.ssm_endpoint.as_deref() {
                builder = builder.endpoint_url(endpoint);
            }
            SsmClient::from_conf(builder.build())
        };

        Self::new(s3, ssm)
    }
}

#[async_trait]
impl CloudProvider for AwsProvider {
    fn name(&self) -> &'static str {
        "aws"
    }

    async fn list_buckets(&self) -> ProviderResult<Vec<String>> {
        let output = self
            .s3
            .list_buckets()
            .send()
            .await
            .map_err(|err| classify("list_buckets", err))?;

        let buckets: Vec<String> = output
            .buckets()
            .iter()
            .filter_map(|bucket| bucket.name().map(str::to_string))
            .collect();
        debug!(count = buckets.len(), "listed s3 buckets");
        Ok(buckets)
    }

    async fn list_parameters(&self) -> ProviderResult<Vec<Parameter>> {
        let output = self
            .ssm
            .describe_parameters()
            .send()
            .await
            .map_err(|err| classify("describe_parameters", err))?;

        output
            .parameters()
            .iter()
            .map(|meta| {
                let name = meta.name().ok_or_else(|| {
                    ProviderError::Upstream("describe_parameters returned an unnamed parameter".into())
                })?;
                let kind = meta.r#type().ok_or_else(|| {
                    ProviderError::Upstream(format!("parameter `{name}` has no type"))
                })?;
                Ok(Parameter {
                    name: name.to_string(),
                    kind: convert_type(kind)?,
                    arn: meta.arn().unwrap_or_default().to_string(),
                    value: None,
                })
            })
            .collect()
    }

    async fn get_parameter(&self, name: &str) -> ProviderResult<Parameter> {
        let output = match self
            .ssm
            .get_parameter()
            .name(name)
            .with_decryption(true)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) if is_not_found(&err) => return Err(ProviderError::NotFound(name.to_string())),
            Err(err) => return Err(classify("get_parameter", err)),
        };

        let parameter = output.parameter().ok_or_else(|| {
            ProviderError::Upstream(format!("get_parameter returned no parameter for `{name}`"))
        })?;
        let kind = match parameter.r#type() {
            Some(kind) => convert_type(kind)?,
            None => ParameterType::String,
        };
        Ok(Parameter {
            name: parameter.name().unwrap_or(name).to_string(),
            kind,
            arn: parameter.arn().unwrap_or_default().to_string(),
            value: parameter.value().map(str::to_string),
        })
    }
}

fn convert_type(kind: &SsmParameterType) -> ProviderResult<ParameterType> {
    match kind {
        SsmParameterType::String => Ok(ParameterType::String),
        SsmParameterType::StringList => Ok(ParameterType::StringList),
        SsmParameterType::SecureString => Ok(ParameterType::SecureString),
        other => Err(ProviderError::Upstream(format!(
            "unrecognized parameter type `{}`",
            other.as_str()
        ))),
    }
}

fn is_not_found<R>(err: &SdkError<GetParameterError, R>) -> bool {
    err.as_service_error()
        .is_some_and(GetParameterError::is_parameter_not_found)
}

/// Dispatch failures and timeouts mean the provider was never reached.
fn classify<E, R>(operation: &str, err: SdkError<E, R>) -> ProviderError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let detail = format!("{operation} failed: {}", DisplayErrorContext(&err));
    match err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => {
            ProviderError::Unavailable(detail)
        }
        _ => ProviderError::Upstream(detail),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_ssm::config::http::HttpResponse;
    use aws_sdk_ssm::types::error::{InvalidKeyId, ParameterNotFound};

    #[test]
    fn converts_known_parameter_types() {
        assert_eq!(
            convert_type(&SsmParameterType::SecureString).unwrap(),
            ParameterType::SecureString
        );
        assert_eq!(
            convert_type(&SsmParameterType::StringList).unwrap(),
            ParameterType::StringList
        );
    }

    #[test]
    fn unknown_parameter_type_is_upstream_error() {
        let err = convert_type(&SsmParameterType::from("Binary")).unwrap_err();
        assert!(matches!(err, ProviderError::Upstream(msg) if msg.contains("Binary")));
    }

    #[test]
    fn timeouts_classify_as_unavailable() {
        let err: SdkError<GetParameterError, HttpResponse> =
            SdkError::timeout_error("operation deadline elapsed");
        assert!(!is_not_found(&err));
        assert!(matches!(
            classify("get_parameter", err),
            ProviderError::Unavailable(msg) if msg.starts_with("get_parameter failed")
        ));
    }

    #[test]
    fn missing_parameter_service_error_is_not_found() {
        let err = SdkError::service_error(
            GetParameterError::ParameterNotFound(
                ParameterNotFound::builder().message("no such parameter").build(),
            ),
            (),
        );
        assert!(is_not_found(&err));
    }

    #[test]
    fn other_service_errors_classify_as_upstream() {
        let err = SdkError::service_error(
            GetParameterError::InvalidKeyId(InvalidKeyId::builder().message("bad key").build()),
            (),
        );
        assert!(!is_not_found(&err));
        assert!(matches!(
            classify("get_parameter", err),
            ProviderError::Upstream(msg) if msg.starts_with("get_parameter failed")
        ));
    }
}
