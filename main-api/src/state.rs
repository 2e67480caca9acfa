use std::sync::Arc;

use relay_core::{AggregatedEnvelope, UpstreamEnvelope};

use crate::client::AuxClient;
use crate::error::{AppError, AppErrorKind};

#[derive(Clone)]
pub struct AppState {
    pub main_api_version: Arc<str>,
    pub aux: AuxClient,
}

impl AppState {
    pub fn new(main_api_version: impl Into<String>, aux: AuxClient) -> Self {
        Self {
            main_api_version: Arc::from(main_api_version.into()),
            aux,
        }
    }

    pub fn aggregate(&self, upstream: UpstreamEnvelope) -> AggregatedEnvelope {
        AggregatedEnvelope::merge(self.main_api_version.as_ref(), upstream)
    }

    pub fn error(&self, kind: AppErrorKind) -> AppError {
        AppError::new(kind, self.main_api_version.clone())
    }
}
