//! Fixed upstream endpoints, parsed once at startup.

use thiserror::Error;
use url::Url;

use crate::rewrite::path::UrlPath;

/// Error type for endpoint parsing.
#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("invalid {role} URL '{url}': {source}")]
    Parse {
        role: &'static str,
        url: String,
        source: url::ParseError,
    },

    #[error("{role} URL '{url}' has no host")]
    MissingHost { role: &'static str, url: String },

    #[error("{role} URL '{url}' has unsupported scheme '{scheme}' (expected http or https)")]
    UnsupportedScheme {
        role: &'static str,
        url: String,
        scheme: String,
    },
}

fn parse_http_url(role: &'static str, raw: &str) -> Result<Url, EndpointError> {
    let url = Url::parse(raw).map_err(|source| EndpointError::Parse {
        role,
        url: raw.to_string(),
        source,
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(EndpointError::UnsupportedScheme {
            role,
            url: raw.to_string(),
            scheme: url.scheme().to_string(),
        });
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(EndpointError::MissingHost {
            role,
            url: raw.to_string(),
        });
    }
    Ok(url)
}

/// `host[:port]` of a URL, with the port only when it is not the scheme default.
pub fn url_authority(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

/// The intermediate forward proxy every outbound connection is dialed through.
#[derive(Debug, Clone)]
pub struct ProxyEndpoint {
    url: Url,
    authority: String,
}

impl ProxyEndpoint {
    pub fn parse(raw: &str) -> Result<Self, EndpointError> {
        let url = parse_http_url("proxy", raw)?;
        let authority = url_authority(&url);
        Ok(Self { url, authority })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// `host[:port]` of the proxy, used by the `proxy` Host-header policy.
    pub fn authority(&self) -> &str {
        &self.authority
    }
}

/// The fixed upstream all traffic is forwarded to, decomposed for rewriting.
#[derive(Debug, Clone)]
pub struct TargetEndpoint {
    url: Url,
    authority: String,
    path: UrlPath,
    raw_query: String,
}

impl TargetEndpoint {
    pub fn parse(raw: &str) -> Result<Self, EndpointError> {
        let url = parse_http_url("target", raw)?;
        let authority = url_authority(&url);
        let path = UrlPath::from_escaped(url.path());
        let raw_query = url.query().unwrap_or_default().to_string();
        Ok(Self {
            url,
            authority,
            path,
            raw_query,
        })
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn path(&self) -> &UrlPath {
        &self.path
    }

    pub fn raw_query(&self) -> &str {
        &self.raw_query
    }
}
