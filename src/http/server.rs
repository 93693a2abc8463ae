//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with one wildcard proxy handler
//! - Wire up middleware (request span)
//! - Bind server to listener
//! - Hand every request to the dispatcher
//! - Graceful shutdown on the shared shutdown signal

use std::io;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::Response,
    routing::any,
    serve::Listener as _,
    Router,
};
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::config::ProxyConfig;
use crate::http::dispatcher::Dispatcher;
use crate::http::request::make_request_span;
use crate::lifecycle::StartupError;
use crate::net::{ClientAddr, Listener};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, StartupError> {
        let dispatcher = Arc::new(Dispatcher::from_config(&config)?);
        let router = Self::build_router(AppState { dispatcher });
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
    }

    /// The router, for serving on a custom stack or driving directly in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(self, listener: Listener, mut shutdown: broadcast::Receiver<()>) -> io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            proxy = %self.config.upstream.proxy_url,
            target = %self.config.upstream.target_url,
            debug = self.config.observability.debug,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<ClientAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Draining in-flight requests");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main proxy handler.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(ClientAddr(client_addr)): ConnectInfo<ClientAddr>,
    request: Request<Body>,
) -> Response {
    state.dispatcher.dispatch(request, Some(client_addr)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use axum::extract::connect_info::MockConnectInfo;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    fn config(proxy_url: &str) -> ProxyConfig {
        let mut config = ProxyConfig::default();
        config.upstream.proxy_url = proxy_url.into();
        config.upstream.target_url = "http://target.test/base".into();
        config.transport.connect_timeout_secs = 2;
        config
    }

    #[tokio::test]
    async fn unreachable_proxy_yields_bodiless_bad_gateway() {
        let server = HttpServer::new(config("http://127.0.0.1:1")).unwrap();
        let app = server.router().layer(MockConnectInfo(ClientAddr(SocketAddr::from(([127, 0, 0, 1], 40000)))));

        let response = app
            .oneshot(Request::builder().uri("/a?x=1").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert!(body.is_empty());
    }

    #[test]
    fn bad_endpoint_fails_startup() {
        let result = HttpServer::new(config("proxy-host:3128"));
        assert!(matches!(result, Err(StartupError::Endpoint(_))));
    }
}
