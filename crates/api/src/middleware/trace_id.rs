//! Request id propagation.

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request id stored in request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

/// Reuses a usable `X-Request-ID` or generates a UUID v4.
fn request_id_from(value: Option<&HeaderValue>) -> String {
    value
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty() && s.len() <= 128)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Runs the request inside a span carrying its id, logs completion and
/// echoes the id in the response headers.
pub async fn trace_id(mut req: Request<Body>, next: Next) -> Response {
    let request_id = request_id_from(req.headers().get(REQUEST_ID_HEADER));
    req.extensions_mut().insert(RequestId(request_id.clone()));

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %req.method(),
        path = %req.uri().path(),
    );

    async move {
        let start = std::time::Instant::now();
        let mut response = next.run(req).await;

        tracing::info!(
            status = response.status().as_u16(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Request completed"
        );

        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response
                .headers_mut()
                .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
        }
        response
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_reused_from_header() {
        let value = HeaderValue::from_static("req-123_abc.xyz");
        assert_eq!(request_id_from(Some(&value)), "req-123_abc.xyz");
    }

    #[test]
    fn test_request_id_generated_when_missing_or_blank() {
        let generated = request_id_from(None);
        assert!(Uuid::parse_str(&generated).is_ok());

        let blank = HeaderValue::from_static("  ");
        assert!(Uuid::parse_str(&request_id_from(Some(&blank))).is_ok());
    }

    #[test]
    fn test_overlong_request_id_replaced() {
        let long = "a".repeat(200);
        let value = HeaderValue::from_str(&long).unwrap();
        assert_ne!(request_id_from(Some(&value)), long);
    }
}
