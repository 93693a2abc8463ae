//! Upstream subsystem.
//!
//! # Data Flow
//! ```text
//! OutboundRequest
//!     → transport.rs (connection slot, dial via forward proxy, send)
//!     → Ok: observer.rs (inspect status, diagnostics only)
//!     → Err: failure.rs (log, bodiless 502)
//! ```
//!
//! # Design Decisions
//! - Endpoints are parsed once at startup and shared read-only
//! - Every failure to reach the target collapses into one `DispatchError`

pub mod endpoint;
pub mod error;
pub mod failure;
pub mod observer;
pub mod transport;

pub use endpoint::{EndpointError, ProxyEndpoint, TargetEndpoint};
pub use error::DispatchError;
pub use failure::FailureReporter;
pub use observer::{ResponseObserver, StatusDiagnostic};
pub use transport::{Dispatched, Transport, TransportError};
