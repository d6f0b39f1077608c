//! Per-request spans.
//!
//! Every log line emitted while a request is dispatched carries the request
//! id, host and path of that request.

use axum::http::{header, Request};
use tower_http::trace::MakeSpan;
use tracing::Span;

use crate::http::request::X_REQUEST_ID;

/// Span factory for `TraceLayer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestSpan;

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let headers = request.headers();
        let request_id = headers
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");
        let host = headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .or_else(|| request.uri().host())
            .unwrap_or("-");

        tracing::info_span!(
            "request",
            method = %request.method(),
            host,
            path = %request.uri().path(),
            request_id
        )
    }
}
