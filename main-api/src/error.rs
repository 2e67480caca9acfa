use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use relay_core::telemetry::{CORRELATION_ID_HEADER, CorrelationId};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppErrorKind {
    /// The auxiliary service answered 404; its body is relayed untouched.
    #[error("auxiliary service reported not found")]
    NotFound { body: Bytes },
    #[error("{0}")]
    BadRequest(String),
    #[error("Not found.")]
    UnknownRoute,
    #[error("Auxiliary Service returned an error.")]
    BadGateway,
    #[error("Auxiliary Service connection failed at {endpoint}.")]
    Unavailable { endpoint: String },
    #[error("An unexpected error occurred.")]
    Internal,
}

#[derive(Debug, Error)]
#[error("{kind}")]
pub struct AppError {
    kind: AppErrorKind,
    main_api_version: Arc<str>,
    correlation_id: Option<String>,
}

impl AppError {
    pub fn new(kind: AppErrorKind, main_api_version: Arc<str>) -> Self {
        Self {
            kind,
            main_api_version,
            correlation_id: None,
        }
    }

    pub fn with_correlation(mut self, id: String) -> Self {
        self.correlation_id = Some(id);
        self
    }

    fn status(&self) -> StatusCode {
        match self.kind {
            AppErrorKind::NotFound { .. } | AppErrorKind::UnknownRoute => StatusCode::NOT_FOUND,
            AppErrorKind::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppErrorKind::BadGateway => StatusCode::BAD_GATEWAY,
            AppErrorKind::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    main_api_version: &'a str,
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut response = match self.kind {
            AppErrorKind::NotFound { body } => (
                status,
                [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
                body,
            )
                .into_response(),
            kind => (
                status,
                Json(ErrorBody {
                    main_api_version: &self.main_api_version,
                    error: kind.to_string(),
                }),
            )
                .into_response(),
        };

        if let Some(value) = self
            .correlation_id
            .as_deref()
            .and_then(|id| HeaderValue::from_str(id).ok())
        {
            response.headers_mut().insert(CORRELATION_ID_HEADER, value);
        }
        response
    }
}

pub fn attach_correlation(err: AppError, correlation: &CorrelationId) -> AppError {
    err.with_correlation(correlation.0.clone())
}
