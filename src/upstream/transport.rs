//! Outbound transport through the intermediate forward proxy.
//!
//! # Responsibilities
//! - Dial every connection via the configured forward proxy
//!   (absolute-form requests for `http` targets, `CONNECT` for `https`)
//! - Bound concurrent connections to the target with a semaphore
//! - Apply pool, keep-alive probe, timeout and TLS settings
//!
//! # Design Decisions
//! - Idle pooling is off unless connection reuse is enabled
//! - A connection slot is held until the response body is relayed or dropped
//! - Redirects are relayed to the caller, never followed

use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderMap, StatusCode};
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use url::Url;

use crate::config::TransportConfig;
use crate::rewrite::{OutboundBody, OutboundRequest};
use crate::upstream::endpoint::ProxyEndpoint;
use crate::upstream::error::DispatchError;

/// Error type for transport construction.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid forward proxy '{url}': {source}")]
    Proxy { url: String, source: reqwest::Error },

    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
}

/// Seconds to an optional duration, with zero meaning unbounded.
fn optional_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

/// Pooled HTTP client that always dials through the forward proxy.
#[derive(Debug, Clone)]
pub struct Transport {
    client: reqwest::Client,
    connection_slots: Arc<Semaphore>,
}

impl Transport {
    pub fn new(proxy: &ProxyEndpoint, config: &TransportConfig) -> Result<Self, TransportError> {
        let forward = reqwest::Proxy::all(proxy.url().as_str()).map_err(|source| TransportError::Proxy {
            url: proxy.url().to_string(),
            source,
        })?;

        let idle_per_host = if config.keep_alive {
            config.max_idle_per_host
        } else {
            0
        };

        let mut builder = reqwest::Client::builder()
            .proxy(forward)
            .redirect(reqwest::redirect::Policy::none())
            .pool_max_idle_per_host(idle_per_host)
            .pool_idle_timeout(optional_secs(config.idle_timeout_secs))
            .tcp_keepalive(optional_secs(config.tcp_keepalive_secs))
            .danger_accept_invalid_certs(config.accept_invalid_certs);

        if let Some(timeout) = optional_secs(config.connect_timeout_secs) {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = optional_secs(config.request_timeout_secs) {
            builder = builder.timeout(timeout);
        }

        if config.accept_invalid_certs {
            tracing::warn!("TLS certificate verification of the target is disabled");
        }

        let client = builder.build().map_err(TransportError::Build)?;

        Ok(Self {
            client,
            connection_slots: Arc::new(Semaphore::new(config.max_conns_per_host)),
        })
    }

    /// Connection slots not currently in use.
    pub fn available_slots(&self) -> usize {
        self.connection_slots.available_permits()
    }

    /// Send the request and wait for the response head.
    pub async fn dispatch(&self, request: OutboundRequest) -> Result<Dispatched, DispatchError> {
        let slot = self
            .connection_slots
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| DispatchError::SlotsClosed)?;

        let OutboundRequest { head, body } = request;
        let body = match body {
            OutboundBody::Empty => reqwest::Body::from(Bytes::new()),
            OutboundBody::Buffered(bytes) => reqwest::Body::from(bytes),
            OutboundBody::Streaming(body) => reqwest::Body::wrap_stream(body.into_data_stream()),
        };

        let response = self
            .client
            .request(head.method, head.url)
            .headers(head.headers)
            .body(body)
            .send()
            .await?;

        Ok(Dispatched { response, slot })
    }
}

/// A response whose head has arrived; the body is still on the wire.
#[derive(Debug)]
pub struct Dispatched {
    response: reqwest::Response,
    slot: OwnedSemaphorePermit,
}

impl Dispatched {
    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    /// The URL the request was sent to.
    pub fn url(&self) -> &Url {
        self.response.url()
    }

    /// Split into status, headers and a body stream that keeps the
    /// connection slot until it is exhausted or dropped.
    pub fn into_parts(self) -> (StatusCode, HeaderMap, impl Stream<Item = reqwest::Result<Bytes>> + Send + 'static) {
        let Dispatched { response, slot } = self;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes_stream().map(move |chunk| {
            let _slot = &slot;
            chunk
        });
        (status, headers, body)
    }
}
