//! Dispatch failure reporting.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::observability::metrics;
use crate::upstream::error::DispatchError;

/// Logs failed dispatches and answers them without a custom body.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailureReporter;

impl FailureReporter {
    /// Log the failure and produce the generic response for the caller.
    ///
    /// No retry is attempted; the error detail never reaches the body.
    pub fn report(&self, method: &str, uri: &str, error: &DispatchError) -> Response {
        tracing::error!(
            method,
            uri,
            kind = error.kind(),
            error = %error,
            "Dispatch failed"
        );
        metrics::record_dispatch_failure(error.kind());
        StatusCode::BAD_GATEWAY.into_response()
    }
}
