//! Per-request dispatch failures.

use thiserror::Error;

use crate::rewrite::RewriteError;

/// Any failure reaching or completing a request against the target.
///
/// All variants are recovered per request: logged by the failure reporter and
/// answered with a bodiless 502.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("could not rewrite request: {0}")]
    Rewrite(#[from] RewriteError),

    #[error("could not connect through the forward proxy: {0}")]
    Connect(#[source] reqwest::Error),

    #[error("upstream timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    #[error("upstream request failed: {0}")]
    Upstream(#[source] reqwest::Error),

    #[error("connection slots closed")]
    SlotsClosed,

    #[error("response hook rejected the response: {0}")]
    ResponseHook(String),
}

impl DispatchError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::Rewrite(_) => "rewrite",
            DispatchError::Connect(_) => "connect",
            DispatchError::Timeout(_) => "timeout",
            DispatchError::Upstream(_) => "upstream",
            DispatchError::SlotsClosed => "slots_closed",
            DispatchError::ResponseHook(_) => "response_hook",
        }
    }
}

impl From<reqwest::Error> for DispatchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            DispatchError::Timeout(e)
        } else if e.is_connect() {
            DispatchError::Connect(e)
        } else {
            DispatchError::Upstream(e)
        }
    }
}
