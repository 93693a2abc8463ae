//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, one wildcard route)
//!     → request.rs (request ID span)
//!     → dispatcher.rs (director → transport → observer / failure reporter)
//!     → response.rs (strip hop-by-hop headers, stream body)
//!     → Send to client
//! ```

pub mod dispatcher;
pub mod headers;
pub mod request;
pub mod response;
pub mod server;

pub use dispatcher::Dispatcher;
pub use request::RequestId;
pub use server::HttpServer;
