//! Request tagging and accounting.
//!
//! # Responsibilities
//! - Generate or propagate the `x-request-id` header
//! - Open one tracing span per request carrying instance and request id
//! - Log and count every completed request
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Metrics use the matched route template, never the raw path

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{MatchedPath, Request, State},
    http::HeaderName,
    middleware::Next,
    response::Response,
};
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{MakeSpan, TraceLayer};
use tracing::Span;

use crate::http::server::AppState;
use crate::observability::metrics;

/// Header carrying the request correlation id.
pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Header naming the instance that answered.
pub static X_INSTANCE_ID: HeaderName = HeaderName::from_static("x-instance-id");

/// Span factory tagging each request with the serving instance.
#[derive(Clone)]
pub struct RequestSpan {
    instance: Arc<str>,
}

impl RequestSpan {
    pub fn new(instance: Arc<str>) -> Self {
        Self { instance }
    }
}

impl MakeSpan<Body> for RequestSpan {
    fn make_span(&mut self, request: &axum::http::Request<Body>) -> Span {
        let request_id = request
            .headers()
            .get(&X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown");

        tracing::info_span!(
            "request",
            instance = %self.instance,
            request_id = %request_id,
            method = %request.method(),
            uri = %request.uri(),
        )
    }
}

/// Tracing layer with per-instance request spans.
pub fn trace_layer(instance: Arc<str>) -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>, RequestSpan> {
    TraceLayer::new_for_http().make_span_with(RequestSpan::new(instance))
}

/// Log and record metrics for each completed request.
pub async fn track_request(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    let status = response.status().as_u16();

    tracing::info!(
        method = %method,
        path = %path,
        status,
        duration_ms = start.elapsed().as_millis() as u64,
        "Request completed"
    );
    metrics::record_request(&state.instance, &method, &route, status, start);

    response
}
