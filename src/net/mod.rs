//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limits)
//!     → Hand off to HTTP layer (axum::serve)
//! ```
//!
//! # Design Decisions
//! - Bounded accept queue prevents resource exhaustion
//! - Each connection holds a slot until the socket is dropped
//! - Plain HTTP only; TLS on the inbound side is not offered

pub mod listener;

pub use listener::{ClientAddr, Listener, ListenerError};
