use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;
use tracing::Instrument;
use ulid::Ulid;

/// Request-scoped id echoed back in `x-correlation-id` and stamped on every
/// event and error envelope the request produces.
#[derive(Clone, Debug)]
pub struct CorrelationId(pub String);

pub const CORRELATION_HEADER: &str = "x-correlation-id";

impl CorrelationId {
    fn from_request(request: &Request<Body>) -> Self {
        let id = request
            .headers()
            .get(CORRELATION_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map_or_else(|| format!("corr_{}", Ulid::new()), str::to_string);
        Self(id)
    }
}

pub async fn correlation_middleware(mut request: Request<Body>, next: Next) -> Response {
    let correlation = CorrelationId::from_request(&request);
    let span = tracing::info_span!(
        "request",
        correlation_id = %correlation.0,
        method = %request.method(),
        path = %request.uri().path()
    );
    request.extensions_mut().insert(correlation.clone());

    let mut response = next.run(request).instrument(span).await;
    if let Ok(value) = HeaderValue::from_str(&correlation.0) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(CORRELATION_HEADER), value);
    }
    response
}
