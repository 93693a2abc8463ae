//! Startup orchestration.
//!
//! # Responsibilities
//! - Load configuration and layer command-line values on top
//! - Validate, then build endpoints and the upstream transport
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when ready)

use clap::error::ErrorKind;
use clap::CommandFactory;
use thiserror::Error;

use crate::cli::Cli;
use crate::config::{finalize_config, load_config, ConfigError, ProxyConfig};
use crate::net::ListenerError;
use crate::upstream::{EndpointError, ProxyEndpoint, TargetEndpoint, TransportError};

/// Anything that stops the process before it serves traffic.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("endpoint error: {0}")]
    Endpoint(#[from] EndpointError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("listener error: {0}")]
    Listen(#[from] ListenerError),
}

/// Assemble the validated configuration from the file (if any) and the
/// command line. Both endpoint URLs must parse.
pub fn load(cli: &Cli) -> Result<ProxyConfig, StartupError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    cli.apply(&mut config);
    let config = finalize_config(config)?;

    ProxyEndpoint::parse(&config.upstream.proxy_url)?;
    TargetEndpoint::parse(&config.upstream.target_url)?;
    Ok(config)
}

/// Abort with clap's usage message when startup fails before serving.
pub fn usage_error(error: StartupError) -> clap::Error {
    Cli::command().error(ErrorKind::ValueValidation, error)
}
