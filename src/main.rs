//! proxy-relay
//!
//! Serves plain HTTP and relays each request to a fixed target, always
//! dialing through a forward proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌─────────────────────────────────────────────────────┐
//!                    │                     PROXY RELAY                      │
//!                    │                                                      │
//!  Client Request    │  ┌─────────┐   ┌─────────┐   ┌────────────┐          │
//!  ──────────────────┼─▶│   net   │──▶│  http   │──▶│  rewrite   │          │
//!                    │  │listener │   │ server  │   │  director  │          │
//!                    │  └─────────┘   └─────────┘   └─────┬──────┘          │
//!                    │                                    │                 │
//!                    │                                    ▼                 │
//!                    │                             ┌────────────┐  CONNECT / │
//!                    │                             │  upstream  │  absolute  │   Forward
//!                    │                             │ transport  │──form──────┼──▶ Proxy ──▶ Target
//!                    │                             └─────┬──────┘            │
//!                    │                                   ▼                  │
//!  Client Response   │  ┌─────────┐   ┌──────────────────────────┐          │
//!  ◀─────────────────┼──│response │◀──│ observer / failure (502) │          │
//!                    │  └─────────┘   └──────────────────────────┘          │
//!                    │                                                      │
//!                    │   config · lifecycle · observability                 │
//!                    └─────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;

use clap::Parser;

use proxy_relay::cli::Cli;
use proxy_relay::lifecycle::{signals, startup, Shutdown, StartupError};
use proxy_relay::net::Listener;
use proxy_relay::observability::{logging, metrics};
use proxy_relay::HttpServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = startup::load(&cli).unwrap_or_else(|e| startup::usage_error(e).exit());

    logging::init(&config.observability.log_level);

    tracing::info!("proxy-relay v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        proxy_url = %config.upstream.proxy_url,
        target_url = %config.upstream.target_url,
        host_header = ?config.upstream.host_header,
        keep_alive = config.transport.keep_alive,
        debug = config.observability.debug,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let server = HttpServer::new(config.clone())?;
    let listener = Listener::bind(&config.listener).await.map_err(StartupError::Listen)?;

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
