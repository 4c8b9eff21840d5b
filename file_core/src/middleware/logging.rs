//! Per-request tracing spans for the HTTP layer

use http::{Request, Response, StatusCode};
use std::time::Duration;
use tower_http::{
    classify::{ServerErrorsAsFailures, ServerErrorsFailureClass, SharedClassifier},
    trace::{DefaultOnBodyChunk, DefaultOnEos, MakeSpan, OnFailure, OnRequest, OnResponse, TraceLayer},
};
use tracing::{info_span, Span};

pub type HttpTraceLayer = TraceLayer<SharedClassifier<ServerErrorsAsFailures>>;

pub fn logging_layer() -> TraceLayer<
    SharedClassifier<ServerErrorsAsFailures>,
    impl MakeSpan<axum::body::Body> + Clone,
    impl OnRequest<axum::body::Body> + Clone,
    impl OnResponse<axum::body::Body> + Clone,
    DefaultOnBodyChunk,
    DefaultOnEos,
    impl OnFailure<ServerErrorsFailureClass> + Clone,
> {
    TraceLayer::new_for_http()
        .make_span_with(|request: &Request<_>| {
            info_span!(
                "http_request",
                method = %request.method(),
                path = %request.uri().path(),
                query = ?request.uri().query(),
            )
        })
        .on_request(|request: &Request<_>, _span: &Span| {
            tracing::debug!("{} {} received", request.method(), request.uri().path());
        })
        .on_response(|response: &Response<_>, latency: Duration, _span: &Span| {
            log_response(response.status(), latency);
        })
        .on_failure(|error: ServerErrorsFailureClass, latency: Duration, _span: &Span| {
            tracing::error!(latency_ms = latency.as_millis(), error = %error, "request failed");
        })
}

fn log_response(status: StatusCode, latency: Duration) {
    let latency_ms = latency.as_millis();

    if status.is_client_error() {
        tracing::warn!(status = status.as_u16(), latency_ms, "request rejected");
    } else if status.is_server_error() {
        tracing::error!(status = status.as_u16(), latency_ms, "request errored");
    } else {
        tracing::info!(status = status.as_u16(), latency_ms, "request completed");
    }
}
