use std::sync::Arc;

use axum::Json;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use relay_core::telemetry::{CORRELATION_ID_HEADER, CorrelationId};
use relay_core::{Envelope, ErrorData};
use thiserror::Error;

/// Caller-facing failures. The message is what the caller sees, so it never
/// carries provider error text.
#[derive(Debug, Error)]
pub enum AppErrorKind {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
}

#[derive(Debug, Error)]
#[error("{kind}")]
pub struct AppError {
    kind: AppErrorKind,
    service_version: Arc<str>,
    correlation_id: Option<String>,
}

impl AppError {
    pub fn new(kind: AppErrorKind, service_version: Arc<str>) -> Self {
        Self {
            kind,
            service_version,
            correlation_id: None,
        }
    }

    pub fn with_correlation(mut self, id: String) -> Self {
        self.correlation_id = Some(id);
        self
    }

    fn status(&self) -> StatusCode {
        match self.kind {
            AppErrorKind::NotFound(_) => StatusCode::NOT_FOUND,
            AppErrorKind::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(Envelope::new(
            self.service_version.as_ref(),
            ErrorData::new(self.kind.to_string()),
        ));

        let mut response = (status, body).into_response();
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
