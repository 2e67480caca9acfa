//! Cloud provider abstraction used by the HTTP handlers.

#[cfg(feature = "aws")]
pub mod aws;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use relay_core::Parameter;
use thiserror::Error;

pub use memory::MemoryProvider;

/// Failure classes reported by a provider. Handlers only ever surface
/// `NotFound` to callers; the other variants are logged and collapsed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("parameter `{0}` not found")]
    NotFound(String),
    #[error("provider unreachable: {0}")]
    Unavailable(String),
    #[error("provider error: {0}")]
    Upstream(String),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

pub type SharedProvider = Arc<dyn CloudProvider>;

#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Names of every bucket visible to the account.
    async fn list_buckets(&self) -> ProviderResult<Vec<String>>;

    /// Parameter metadata without values.
    async fn list_parameters(&self) -> ProviderResult<Vec<Parameter>>;

    /// A single parameter with its decrypted value.
    async fn get_parameter(&self, name: &str) -> ProviderResult<Parameter>;
}
