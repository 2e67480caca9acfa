use axum::body::Body;
use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;
use tracing::{Instrument, Span, info_span};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CorrelationId(pub String);

impl CorrelationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Install the JSON log subscriber. `RUST_LOG` wins over the level picked
/// by `verbose`.
pub fn init(verbose: bool) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(verbose)))?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_target(false),
        )
        .try_init()
        .ok();

    Ok(())
}

fn default_directive(verbose: bool) -> &'static str {
    if verbose { "debug,hyper=info,h2=info" } else { "info" }
}

/// Tags every request with a correlation id, reusing the caller's when it is
/// a valid header value, and echoes it on the response.
pub async fn correlation_layer(mut req: Request<Body>, next: Next) -> Response {
    let (correlation, header_value) = match req
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|value| value.to_str().ok().map(|s| (s.to_string(), value.clone())))
    {
        Some((id, value)) if !id.is_empty() => (CorrelationId(id), value),
        _ => {
            let id = CorrelationId::generate();
            let value = HeaderValue::from_str(id.as_str())
                .unwrap_or_else(|_| HeaderValue::from_static("invalid"));
            (id, value)
        }
    };

    req.extensions_mut().insert(correlation.clone());
    req.headers_mut()
        .insert(CORRELATION_ID_HEADER, header_value.clone());

    let span = info_span!(
        "request",
        method = %req.method(),
        uri = %req.uri(),
        correlation_id = %correlation.0
    );

    let mut response = next.run(req).instrument(span).await;
    response
        .headers_mut()
        .insert(CORRELATION_ID_HEADER, header_value);
    response
}

pub fn request_span(name: &str, correlation_id: &str) -> Span {
    info_span!(
        "relay.op",
        operation = name,
        correlation_id = %correlation_id
    )
}
