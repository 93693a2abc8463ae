//! Response observation hook.

use std::time::{SystemTime, UNIX_EPOCH};

use axum::http::StatusCode;
use url::Url;

use crate::upstream::error::DispatchError;

/// A non-success response seen while diagnostics are enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusDiagnostic {
    pub observed_at: SystemTime,
    pub status: StatusCode,
    pub url: Url,
}

/// Inspects each upstream response head. Never touches headers or body.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseObserver {
    debug: bool,
}

impl ResponseObserver {
    pub fn new(debug: bool) -> Self {
        Self { debug }
    }

    /// Record a diagnostic for any status other than 200 when diagnostics are on.
    ///
    /// An `Err` is treated as a dispatch failure by the caller.
    pub fn observe(&self, status: StatusCode, url: &Url) -> Result<Option<StatusDiagnostic>, DispatchError> {
        if !self.debug || status == StatusCode::OK {
            return Ok(None);
        }

        let diagnostic = StatusDiagnostic {
            observed_at: SystemTime::now(),
            status,
            url: url.clone(),
        };
        let observed_at_ms = diagnostic
            .observed_at
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or_default();
        tracing::info!(
            observed_at_ms,
            status = diagnostic.status.as_u16(),
            url = %diagnostic.url,
            "Upstream returned non-success status"
        );
        Ok(Some(diagnostic))
    }
}
