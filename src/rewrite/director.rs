//! Per-request rewrite from the inbound form to the outbound form.
//!
//! # Responsibilities
//! - Point the request at the fixed target (scheme, authority, joined path/query)
//! - Apply the configured Host-header policy
//! - Default a missing `User-Agent` to an explicitly empty value
//! - Strip hop-by-hop headers and record the client in `X-Forwarded-For`
//! - Dump the outbound request when diagnostics are enabled
//! - Ask for the connection to be closed when reuse is disabled
//!
//! # Design Decisions
//! - `rewrite` is a pure function of the request head, with no I/O
//! - The intermediate proxy never shows up in the rewritten URL; only the
//!   transport consults it at dial time

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{self, HeaderMap, HeaderValue, InvalidHeaderValue};
use axum::http::request::Parts;
use axum::http::{Method, Request};
use bytes::Bytes;
use thiserror::Error;
use url::Url;

use crate::config::HostHeaderPolicy;
use crate::rewrite::dump::dump_request_out;
use crate::rewrite::path::{has_dot_segment, join_url_path, merge_query, UrlPath};
use crate::upstream::endpoint::{ProxyEndpoint, TargetEndpoint};

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Error type for request rewriting.
#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("rewritten URL '{url}' is invalid: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("request path '{path}' contains a dot segment")]
    DotSegment { path: String },

    #[error("invalid Host header value: {0}")]
    InvalidHost(#[from] InvalidHeaderValue),
}

/// Outbound request line and headers.
#[derive(Debug, Clone)]
pub struct OutboundHead {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    /// Close the upstream connection once the response completes.
    pub close: bool,
}

/// Outbound request body.
#[derive(Debug)]
pub enum OutboundBody {
    Empty,
    Buffered(Bytes),
    Streaming(Body),
}

impl OutboundBody {
    /// Stream the inbound body through, unless the inbound headers say there
    /// is none. Must see the headers before hop-by-hop stripping.
    fn from_inbound(headers: &HeaderMap, body: Body) -> Self {
        let chunked = headers.contains_key(header::TRANSFER_ENCODING);
        let sized = headers
            .get(header::CONTENT_LENGTH)
            .is_some_and(|length| length.as_bytes() != b"0");
        if chunked || sized {
            OutboundBody::Streaming(body)
        } else {
            OutboundBody::Empty
        }
    }
}

/// A fully rewritten request, ready for dispatch.
#[derive(Debug)]
pub struct OutboundRequest {
    pub head: OutboundHead,
    pub body: OutboundBody,
}

/// Knobs the director reads on every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectorOptions {
    pub host_header: HostHeaderPolicy,
    /// Mark every outbound request `Connection: close`.
    pub close_connections: bool,
    /// Dump each outbound request before dispatch.
    pub debug: bool,
}

/// Rewrites inbound requests so they address the fixed target.
#[derive(Debug, Clone)]
pub struct Director {
    target: Arc<TargetEndpoint>,
    proxy: Arc<ProxyEndpoint>,
    options: DirectorOptions,
}

impl Director {
    pub fn new(target: Arc<TargetEndpoint>, proxy: Arc<ProxyEndpoint>, options: DirectorOptions) -> Self {
        Self {
            target,
            proxy,
            options,
        }
    }

    /// Rewrite the inbound request head into its outbound form.
    pub fn rewrite(&self, parts: &Parts, client_addr: Option<SocketAddr>) -> Result<OutboundHead, RewriteError> {
        let inbound_path = UrlPath::from_escaped(parts.uri.path());
        let path = join_url_path(self.target.path(), &inbound_path);
        if has_dot_segment(&path.escaped()) {
            return Err(RewriteError::DotSegment {
                path: parts.uri.path().to_string(),
            });
        }
        let query = merge_query(self.target.raw_query(), parts.uri.query().unwrap_or_default());

        let mut raw_url = format!("{}://{}{}", self.target.scheme(), self.target.authority(), path.escaped());
        if !query.is_empty() {
            raw_url.push('?');
            raw_url.push_str(&query);
        }
        let url = Url::parse(&raw_url).map_err(|source| RewriteError::InvalidUrl { url: raw_url, source })?;

        let mut headers = parts.headers.clone();
        crate::http::headers::strip_hop_by_hop(&mut headers);

        headers.remove(header::HOST);
        if self.options.host_header == HostHeaderPolicy::Proxy {
            headers.insert(header::HOST, HeaderValue::from_str(self.proxy.authority())?);
        }

        if !headers.contains_key(header::USER_AGENT) {
            // An explicit empty value keeps the client from adding its own.
            headers.insert(header::USER_AGENT, HeaderValue::from_static(""));
        }

        if let Some(addr) = client_addr {
            append_forwarded_for(&mut headers, addr.ip());
        }

        let close = self.options.close_connections;
        if close {
            headers.insert(header::CONNECTION, HeaderValue::from_static("close"));
        }

        Ok(OutboundHead {
            method: parts.method.clone(),
            url,
            headers,
            close,
        })
    }

    /// Rewrite a full inbound request, dumping it first when diagnostics are on.
    pub async fn direct(&self, request: Request<Body>, client_addr: Option<SocketAddr>) -> Result<OutboundRequest, RewriteError> {
        let (parts, body) = request.into_parts();
        let mut head = self.rewrite(&parts, client_addr)?;
        let body = OutboundBody::from_inbound(&parts.headers, body);

        if !self.options.debug {
            return Ok(OutboundRequest { head, body });
        }

        let buffered = match body {
            OutboundBody::Streaming(body) => axum::body::to_bytes(body, usize::MAX).await,
            OutboundBody::Buffered(bytes) => Ok(bytes),
            OutboundBody::Empty => Ok(Bytes::new()),
        };
        let bytes = match buffered {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read request body for dump, forwarding without it");
                head.headers.remove(header::CONTENT_LENGTH);
                Bytes::new()
            }
        };
        match dump_request_out(&head, &bytes) {
            Ok(dump) => tracing::info!(dump = ?dump, "Outbound request"),
            Err(e) => tracing::warn!(error = %e, "Failed to dump outbound request"),
        }

        Ok(OutboundRequest {
            head,
            body: OutboundBody::Buffered(bytes),
        })
    }
}

fn append_forwarded_for(headers: &mut HeaderMap, ip: IpAddr) {
    let prior: Vec<&str> = headers
        .get_all(X_FORWARDED_FOR)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect();
    let value = if prior.is_empty() {
        ip.to_string()
    } else {
        format!("{}, {}", prior.join(", "), ip)
    };
    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.insert(X_FORWARDED_FOR, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn director(options: DirectorOptions) -> Director {
        Director::new(
            Arc::new(TargetEndpoint::parse("http://target.test:8080/base?y=2").unwrap()),
            Arc::new(ProxyEndpoint::parse("http://proxy.test:3128").unwrap()),
            options,
        )
    }

    fn parts(uri: &str, headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn rewrites_url_to_target() {
        let head = director(DirectorOptions::default())
            .rewrite(&parts("/a/b?x=1", &[]), None)
            .unwrap();
        assert_eq!(head.url.as_str(), "http://target.test:8080/base/a/b?y=2&x=1");
    }

    #[test]
    fn keeps_escaped_segments() {
        let head = director(DirectorOptions::default())
            .rewrite(&parts("/a%2Fb", &[]), None)
            .unwrap();
        assert_eq!(head.url.path(), "/base/a%2Fb");
        assert_eq!(head.url.query(), Some("y=2"));
    }

    #[test]
    fn host_header_policies() {
        let inbound = parts("/", &[("host", "inbound.test")]);

        let head = director(DirectorOptions::default()).rewrite(&inbound, None).unwrap();
        assert!(head.headers.get(header::HOST).is_none());

        let head = director(DirectorOptions {
            host_header: HostHeaderPolicy::Proxy,
            ..Default::default()
        })
        .rewrite(&inbound, None)
        .unwrap();
        assert_eq!(head.headers[header::HOST], "proxy.test:3128");
    }

    #[test]
    fn missing_user_agent_is_explicitly_empty() {
        let head = director(DirectorOptions::default()).rewrite(&parts("/", &[]), None).unwrap();
        assert_eq!(head.headers[header::USER_AGENT], "");

        let head = director(DirectorOptions::default())
            .rewrite(&parts("/", &[("user-agent", "curl/8.0")]), None)
            .unwrap();
        assert_eq!(head.headers[header::USER_AGENT], "curl/8.0");
    }

    #[test]
    fn close_follows_connection_reuse() {
        let inbound = parts("/", &[("connection", "keep-alive")]);

        let head = director(DirectorOptions {
            close_connections: true,
            ..Default::default()
        })
        .rewrite(&inbound, None)
        .unwrap();
        assert!(head.close);
        assert_eq!(head.headers[header::CONNECTION], "close");

        let head = director(DirectorOptions::default()).rewrite(&inbound, None).unwrap();
        assert!(!head.close);
        assert!(head.headers.get(header::CONNECTION).is_none());
    }

    #[test]
    fn strips_hop_by_hop_and_appends_forwarded_for() {
        let inbound = parts(
            "/",
            &[
                ("proxy-authorization", "Basic Zm9vOmJhcg=="),
                ("x-forwarded-for", "10.0.0.1"),
                ("accept", "text/html"),
            ],
        );
        let client: SocketAddr = "192.0.2.7:50000".parse().unwrap();

        let head = director(DirectorOptions::default()).rewrite(&inbound, Some(client)).unwrap();

        assert!(head.headers.get(header::PROXY_AUTHORIZATION).is_none());
        assert_eq!(head.headers["x-forwarded-for"], "10.0.0.1, 192.0.2.7");
        assert_eq!(head.headers[header::ACCEPT], "text/html");
    }

    #[tokio::test]
    async fn debug_buffers_body_for_dump() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/submit")
            .header("content-length", "5")
            .body(Body::from("hello"))
            .unwrap();

        let outbound = director(DirectorOptions {
            debug: true,
            ..Default::default()
        })
        .direct(request, None)
        .await
        .unwrap();

        assert_eq!(outbound.head.url.as_str(), "http://target.test:8080/base/submit?y=2");
        assert!(matches!(outbound.body, OutboundBody::Buffered(ref bytes) if &bytes[..] == b"hello"));
    }

    #[test]
    fn encoded_dot_segments_are_rejected() {
        let result = director(DirectorOptions::default()).rewrite(&parts("/a/%2e%2e/%2E%2E/secret", &[]), None);
        assert!(matches!(result, Err(RewriteError::DotSegment { .. })));

        let result = director(DirectorOptions::default()).rewrite(&parts("/a/../../secret", &[]), None);
        assert!(matches!(result, Err(RewriteError::DotSegment { .. })));
    }

    #[tokio::test]
    async fn chunked_body_is_streamed() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/upload")
            .header("transfer-encoding", "chunked")
            .body(Body::from("hello"))
            .unwrap();

        let outbound = director(DirectorOptions::default()).direct(request, None).await.unwrap();

        assert!(outbound.head.headers.get(header::TRANSFER_ENCODING).is_none());
        let OutboundBody::Streaming(body) = outbound.body else {
            panic!("chunked body was not streamed");
        };
        let bytes = axum::body::to_bytes(body, 1024).await.unwrap();
        assert_eq!(&bytes[..], b"hello");
    }

    #[tokio::test]
    async fn chunked_body_is_buffered_for_dump() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/upload")
            .header("transfer-encoding", "chunked")
            .body(Body::from("hello"))
            .unwrap();

        let outbound = director(DirectorOptions {
            debug: true,
            ..Default::default()
        })
        .direct(request, None)
        .await
        .unwrap();

        assert!(matches!(outbound.body, OutboundBody::Buffered(ref bytes) if &bytes[..] == b"hello"));
    }

    #[tokio::test]
    async fn bodiless_requests_send_no_body() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let outbound = director(DirectorOptions::default()).direct(request, None).await.unwrap();
        assert!(matches!(outbound.body, OutboundBody::Empty));
    }
}
