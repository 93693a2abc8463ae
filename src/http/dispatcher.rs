//! Request dispatch: director, transport, observer and reporter in one place.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;

use crate::config::ProxyConfig;
use crate::http::response::relay_response;
use crate::lifecycle::StartupError;
use crate::observability::metrics;
use crate::rewrite::{Director, DirectorOptions};
use crate::upstream::{DispatchError, FailureReporter, ProxyEndpoint, ResponseObserver, TargetEndpoint, Transport};

/// Serves every inbound request for one (target, forward proxy) pair.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    director: Director,
    transport: Transport,
    observer: ResponseObserver,
    reporter: FailureReporter,
}

impl Dispatcher {
    pub fn new(director: Director, transport: Transport, observer: ResponseObserver, reporter: FailureReporter) -> Self {
        Self {
            director,
            transport,
            observer,
            reporter,
        }
    }

    /// Parse the endpoints and build the transport from a validated config.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, StartupError> {
        let proxy = Arc::new(ProxyEndpoint::parse(&config.upstream.proxy_url)?);
        let target = Arc::new(TargetEndpoint::parse(&config.upstream.target_url)?);
        let transport = Transport::new(&proxy, &config.transport)?;

        let debug = config.observability.debug;
        let director = Director::new(
            target,
            proxy,
            DirectorOptions {
                host_header: config.upstream.host_header,
                close_connections: !config.transport.keep_alive,
                debug,
            },
        );

        Ok(Self::new(director, transport, ResponseObserver::new(debug), FailureReporter))
    }

    /// Rewrite, send and relay one request. Failures never escape: they are
    /// reported and answered with a bodiless 502.
    pub async fn dispatch(&self, request: Request<Body>, client_addr: Option<SocketAddr>) -> Response {
        let start = Instant::now();
        let method = request.method().to_string();
        let uri = request.uri().to_string();

        let outbound = match self.director.direct(request, client_addr).await {
            Ok(outbound) => outbound,
            Err(e) => return self.reporter.report(&method, &uri, &DispatchError::from(e)),
        };

        tracing::debug!(url = %outbound.head.url, close = outbound.head.close, "Dispatching via forward proxy");

        let dispatched = match self.transport.dispatch(outbound).await {
            Ok(dispatched) => dispatched,
            Err(e) => return self.reporter.report(&method, &uri, &e),
        };

        let status = dispatched.status();
        if let Err(e) = self.observer.observe(status, dispatched.url()) {
            return self.reporter.report(&method, &uri, &e);
        }

        metrics::record_request(&method, status.as_u16(), start);
        relay_response(dispatched)
    }
}
