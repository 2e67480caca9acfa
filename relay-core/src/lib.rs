//! Shared building blocks for the cloud relay services.
//!
//! Both tiers speak the same response envelopes and share the same request
//! telemetry, so the wire shapes and the tracing setup live here.

pub mod envelope;
pub mod models;
pub mod shutdown;
pub mod telemetry;

pub use envelope::{AggregatedEnvelope, Envelope, UpstreamEnvelope};
pub use models::{
    BucketList, ErrorData, HealthStatus, Parameter, ParameterList, ParameterSummary,
    ParameterType, ParameterValue,
};
pub use telemetry::{CORRELATION_ID_HEADER, CorrelationId};
