//! Relaying upstream responses to the caller.
//!
//! # Responsibilities
//! - Copy status and end-to-end headers from the upstream response
//! - Stream the body through chunk by chunk
//!
//! # Design Decisions
//! - No buffering: each chunk is handed to the caller as it arrives
//! - Hop-by-hop headers stripped; hyper frames the body for the caller

use axum::body::Body;
use axum::response::Response;

use crate::http::headers::strip_hop_by_hop;
use crate::upstream::Dispatched;

/// Turn a dispatched upstream response into the caller's response.
pub fn relay_response(dispatched: Dispatched) -> Response {
    let (status, mut headers, body) = dispatched.into_parts();
    strip_hop_by_hop(&mut headers);

    let mut response = Response::new(Body::from_stream(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
