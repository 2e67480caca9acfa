use std::sync::Arc;

use relay_core::Envelope;

use crate::error::{AppError, AppErrorKind};
use crate::provider::SharedProvider;

#[derive(Clone)]
pub struct AppState {
    pub service_version: Arc<str>,
    pub provider: SharedProvider,
}

impl AppState {
    pub fn new(service_version: impl Into<String>, provider: SharedProvider) -> Self {
        Self {
            service_version: Arc::from(service_version.into()),
            provider,
        }
    }

    pub fn envelope<T>(&self, data: T) -> Envelope<T> {
        Envelope::new(self.service_version.as_ref(), data)
    }

    pub fn error(&self, kind: AppErrorKind) -> AppError {
        AppError::new(kind, self.service_version.clone())
    }
}
