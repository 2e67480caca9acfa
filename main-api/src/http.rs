use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json, Router, middleware, routing::get};
use relay_core::telemetry::{CorrelationId, correlation_layer, request_span};
use relay_core::{AggregatedEnvelope, HealthStatus};
use tracing::{Instrument, error, info, warn};

use crate::client::ClientError;
use crate::error::{AppError, AppErrorKind, attach_correlation};
use crate::state::AppState;

/// Reported in place of an auxiliary version when nothing was called.
pub const HEALTH_AUX_VERSION: &str = "N/A";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/s3/buckets", get(list_all_buckets))
        .route("/aws/parameters", get(list_all_parameters))
        .route("/aws/parameter/{*name}", get(retrieve_parameter))
        .fallback(unknown_route)
        .layer(middleware::from_fn(correlation_layer))
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(AggregatedEnvelope {
        main_api_version: state.main_api_version.to_string(),
        aux_service_version: HEALTH_AUX_VERSION.to_string(),
        data: HealthStatus::ok().with_message("Main API is running."),
    })
}

async fn unknown_route(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
) -> AppError {
    attach_correlation(state.error(AppErrorKind::UnknownRoute), &correlation)
}

async fn list_all_buckets(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
) -> Result<impl IntoResponse, AppError> {
    let span = request_span("relay.list_buckets", &correlation.0);
    let forwarded = correlation.clone();
    async move {
        let upstream = state
            .aux
            .list_buckets(&forwarded)
            .await
            .map_err(|err| listing_failure(&state, err))?;
        Ok(Json(state.aggregate(upstream)))
    }
    .instrument(span)
    .await
    .map_err(|err: AppError| attach_correlation(err, &correlation))
}

async fn list_all_parameters(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
) -> Result<impl IntoResponse, AppError> {
    let span = request_span("relay.list_parameters", &correlation.0);
    let forwarded = correlation.clone();
    async move {
        let upstream = state
            .aux
            .list_parameters(&forwarded)
            .await
            .map_err(|err| listing_failure(&state, err))?;
        Ok(Json(state.aggregate(upstream)))
    }
    .instrument(span)
    .await
    .map_err(|err: AppError| attach_correlation(err, &correlation))
}

async fn retrieve_parameter(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let span = request_span("relay.get_parameter", &correlation.0);
    let forwarded = correlation.clone();
    async move {
        let upstream = state
            .aux
            .get_parameter(&name, &forwarded)
            .await
            .map_err(|err| retrieval_failure(&state, &name, err))?;
        Ok(Json(state.aggregate(upstream)))
    }
    .instrument(span)
    .await
    .map_err(|err: AppError| attach_correlation(err, &correlation))
}

/// Any failure to obtain a listing from the auxiliary service, an error
/// status included, reads as the service being unavailable. Only a
/// malformed success body is an internal error.
fn listing_failure(state: &AppState, err: ClientError) -> AppError {
    match err {
        ClientError::Transport { endpoint, source } => {
            warn!(%endpoint, error = %source, "auxiliary service unreachable");
            state.error(AppErrorKind::Unavailable { endpoint })
        }
        ClientError::Status {
            endpoint, status, ..
        } => {
            warn!(%endpoint, %status, "auxiliary service returned an error status");
            state.error(AppErrorKind::Unavailable { endpoint })
        }
        other => {
            error!(error = %other, "unexpected failure relaying listing");
            state.error(AppErrorKind::Internal)
        }
    }
}

/// A 404 from the auxiliary service is relayed verbatim; every other
/// answer it gives becomes a bad gateway.
fn retrieval_failure(state: &AppState, name: &str, err: ClientError) -> AppError {
    match err {
        ClientError::RelativeName(_) => {
            info!(parameter = %name, "rejected parameter name with relative segments");
            state.error(AppErrorKind::BadRequest(format!(
                "Parameter name '{name}' must not contain '.' or '..' segments."
            )))
        }
        ClientError::Status { status, body, .. } if status == StatusCode::NOT_FOUND => {
            info!(parameter = %name, "parameter not found upstream");
            state.error(AppErrorKind::NotFound { body })
        }
        ClientError::Status {
            endpoint, status, ..
        } => {
            warn!(%endpoint, %status, parameter = %name, "auxiliary service returned an error status");
            state.error(AppErrorKind::BadGateway)
        }
        ClientError::InvalidResponse { endpoint, reason } => {
            warn!(%endpoint, %reason, parameter = %name, "auxiliary service returned a malformed body");
            state.error(AppErrorKind::BadGateway)
        }
        ClientError::Transport { endpoint, source } => {
            warn!(%endpoint, error = %source, "auxiliary service unreachable");
            state.error(AppErrorKind::Unavailable { endpoint })
        }
        other => {
            error!(error = %other, parameter = %name, "unexpected failure relaying parameter");
            state.error(AppErrorKind::Internal)
        }
    }
}
