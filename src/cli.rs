//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{HostHeaderPolicy, ProxyConfig};

#[derive(Debug, Parser)]
#[command(name = "proxy-relay")]
#[command(version)]
#[command(about = "Reverse proxy to a fixed target, dialed through a forward proxy", long_about = None)]
pub struct Cli {
    /// Forward proxy base URL, e.g. http://proxy-host:3128
    pub proxy_url: String,

    /// Target base URL, e.g. http://host:port/base/path?query
    pub target_url: String,

    /// Pass `debug` to dump outbound requests and log non-200 responses
    #[arg(value_parser = ["debug"])]
    pub mode: Option<String>,

    /// TOML configuration file; command-line values take precedence
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Listen address
    #[arg(short, long)]
    pub listen: Option<String>,

    /// Outbound Host header policy
    #[arg(long, value_enum)]
    pub host_header: Option<HostHeaderPolicy>,

    /// Reuse upstream connections across requests
    #[arg(long)]
    pub keep_alive: bool,

    /// Skip TLS certificate verification of the target
    #[arg(long)]
    pub insecure: bool,

    /// Connect timeout in seconds (0 = none)
    #[arg(long)]
    pub connect_timeout: Option<u64>,

    /// Total request timeout in seconds (0 = none)
    #[arg(long)]
    pub request_timeout: Option<u64>,
}

impl Cli {
    pub fn debug(&self) -> bool {
        self.mode.is_some()
    }

    /// Layer command-line values over a loaded (or default) configuration.
    pub fn apply(&self, config: &mut ProxyConfig) {
        config.upstream.proxy_url = self.proxy_url.clone();
        config.upstream.target_url = self.target_url.clone();

        if let Some(listen) = &self.listen {
            config.listener.bind_address = listen.clone();
        }
        if let Some(policy) = self.host_header {
            config.upstream.host_header = policy;
        }
        if let Some(secs) = self.connect_timeout {
            config.transport.connect_timeout_secs = secs;
        }
        if let Some(secs) = self.request_timeout {
            config.transport.request_timeout_secs = secs;
        }
        config.transport.keep_alive |= self.keep_alive;
        config.transport.accept_invalid_certs |= self.insecure;
        config.observability.debug |= self.debug();
    }
}
