use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::{Extension, Json, Router, middleware, routing::get};
use relay_core::telemetry::{CorrelationId, correlation_layer, request_span};
use relay_core::{BucketList, HealthStatus, ParameterList, ParameterSummary, ParameterValue};
use tracing::{Instrument, error, info, warn};

use crate::error::{AppError, AppErrorKind, attach_correlation};
use crate::provider::ProviderError;
use crate::state::AppState;

const LIST_BUCKETS_FAILED: &str = "Failed to list S3 buckets due to internal AWS error.";
const LIST_PARAMETERS_FAILED: &str = "Failed to list SSM parameters.";
const UNKNOWN_ROUTE: &str = "Not found.";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/aws/s3/buckets", get(list_buckets))
        .route("/aws/ssm/parameters", get(list_parameters))
        .route("/aws/ssm/parameter/{*name}", get(get_parameter))
        .fallback(unknown_route)
        .layer(middleware::from_fn(correlation_layer))
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.envelope(HealthStatus::ok()))
}

async fn unknown_route(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
) -> AppError {
    let err = state.error(AppErrorKind::NotFound(UNKNOWN_ROUTE.to_string()));
    attach_correlation(err, &correlation)
}

async fn list_buckets(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
) -> Result<impl IntoResponse, AppError> {
    let span = request_span("aws.s3.list_buckets", &correlation.0);
    async move {
        let buckets = state
            .provider
            .list_buckets()
            .await
            .map_err(|err| provider_failure(&state, "list_buckets", err, LIST_BUCKETS_FAILED))?;
        info!(count = buckets.len(), "listed buckets");
        Ok(Json(state.envelope(BucketList { buckets })))
    }
    .instrument(span)
    .await
    .map_err(|err: AppError| attach_correlation(err, &correlation))
}

async fn list_parameters(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
) -> Result<impl IntoResponse, AppError> {
    let span = request_span("aws.ssm.list_parameters", &correlation.0);
    async move {
        let parameters: Vec<ParameterSummary> = state
            .provider
            .list_parameters()
            .await
            .map_err(|err| {
                provider_failure(&state, "list_parameters", err, LIST_PARAMETERS_FAILED)
            })?
            .into_iter()
            .map(ParameterSummary::from)
            .collect();
        info!(count = parameters.len(), "listed parameters");
        Ok(Json(state.envelope(ParameterList { parameters })))
    }
    .instrument(span)
    .await
    .map_err(|err: AppError| attach_correlation(err, &correlation))
}

async fn get_parameter(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let span = request_span("aws.ssm.get_parameter", &correlation.0);
    async move {
        match state.provider.get_parameter(&name).await {
            Ok(parameter) => Ok(Json(state.envelope(ParameterValue::from(parameter)))),
            Err(ProviderError::NotFound(_)) => {
                info!(parameter = %name, "parameter not found");
                Err(state.error(AppErrorKind::NotFound(format!(
                    "Parameter '{name}' not found."
                ))))
            }
            Err(err) => Err(provider_failure(
                &state,
                "get_parameter",
                err,
                &format!("Failed to retrieve parameter '{name}'."),
            )),
        }
    }
    .instrument(span)
    .await
    .map_err(|err: AppError| attach_correlation(err, &correlation))
}

/// Log the provider detail and hand the caller only `message`.
fn provider_failure(
    state: &AppState,
    operation: &str,
    err: ProviderError,
    message: &str,
) -> AppError {
    match &err {
        ProviderError::Unavailable(_) => {
            warn!(operation, provider = state.provider.name(), error = %err, "provider unreachable")
        }
        _ => error!(operation, provider = state.provider.name(), error = %err, "provider call failed"),
    }
    state.error(AppErrorKind::Internal(message.to_string()))
}
