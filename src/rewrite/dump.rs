//! Wire-format dump of an outbound request for diagnostics.

use std::fmt::Write;

use axum::http::header::HOST;
use url::Position;

use crate::rewrite::director::OutboundHead;
use crate::upstream::endpoint::url_authority;

/// Serialize the request line, headers and body as they would go on the wire
/// to an origin server.
pub fn dump_request_out(head: &OutboundHead, body: &[u8]) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    write!(out, "{} {} HTTP/1.1\r\n", head.method, &head.url[Position::BeforePath..])?;

    let host = head
        .headers
        .get(HOST)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
        .unwrap_or_else(|| url_authority(&head.url));
    write!(out, "Host: {}\r\n", host)?;

    for (name, value) in head.headers.iter().filter(|(name, _)| **name != HOST) {
        write!(out, "{}: {}\r\n", name, String::from_utf8_lossy(value.as_bytes()))?;
    }
    out.write_str("\r\n")?;
    out.write_str(&String::from_utf8_lossy(body))?;
    Ok(out)
}
