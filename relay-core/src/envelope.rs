use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Version reported when the auxiliary service omitted its own.
pub const UNKNOWN_VERSION: &str = "unknown";

/// Response wrapper produced by the auxiliary service, success or failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T = Value> {
    #[serde(rename = "aux_service_version")]
    pub service_version: String,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn new(service_version: impl Into<String>, data: T) -> Self {
        Self {
            service_version: service_version.into(),
            data,
        }
    }
}

/// Lenient view of an envelope received over the wire; either field may be absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpstreamEnvelope {
    #[serde(default)]
    pub aux_service_version: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

/// Envelope returned by the public API: its own version next to the relayed payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedEnvelope<T = Value> {
    pub main_api_version: String,
    pub aux_service_version: String,
    pub data: T,
}

impl AggregatedEnvelope {
    /// Reshape an upstream envelope without touching its payload.
    pub fn merge(main_api_version: impl Into<String>, upstream: UpstreamEnvelope) -> Self {
        Self {
            main_api_version: main_api_version.into(),
            aux_service_version: upstream
                .aux_service_version
                .unwrap_or_else(|| UNKNOWN_VERSION.to_string()),
            data: upstream.data.unwrap_or_else(|| Value::Object(Map::new())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_serializes_version_under_aux_key() {
        let envelope = Envelope::new("v1.2.3", json!({ "status": "ok" }));
        let encoded = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            encoded,
            json!({ "aux_service_version": "v1.2.3", "data": { "status": "ok" } })
        );
    }

    #[test]
    fn merge_keeps_upstream_fields() {
        let upstream: UpstreamEnvelope = serde_json::from_value(json!({
            "aux_service_version": "aux-7",
            "data": { "buckets": ["a", "b"] }
        }))
        .unwrap();
        let merged = AggregatedEnvelope::merge("main-3", upstream);
        assert_eq!(merged.main_api_version, "main-3");
        assert_eq!(merged.aux_service_version, "aux-7");
        assert_eq!(merged.data, json!({ "buckets": ["a", "b"] }));
    }

    #[test]
    fn merge_fills_missing_fields() {
        let upstream: UpstreamEnvelope = serde_json::from_value(json!({})).unwrap();
        let merged = AggregatedEnvelope::merge("main-3", upstream);
        assert_eq!(merged.aux_service_version, UNKNOWN_VERSION);
        assert_eq!(merged.data, json!({}));
    }

    #[test]
    fn upstream_ignores_unknown_fields() {
        let upstream: UpstreamEnvelope = serde_json::from_value(json!({
            "aux_service_version": "aux-1",
            "data": [],
            "extra": true
        }))
        .unwrap();
        assert_eq!(upstream.data, Some(json!([])));
    }
}
