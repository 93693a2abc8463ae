//! Request rewriting subsystem.
//!
//! # Data Flow
//! ```text
//! inbound request (path, query, headers)
//!     → path.rs (join target path + request path, merge queries)
//!     → director.rs (target URL, Host policy, User-Agent, hop-by-hop, close)
//!     → dump.rs (wire dump, diagnostics only)
//!     → OutboundRequest handed to the upstream transport
//! ```

pub mod director;
pub mod dump;
pub mod path;

pub use director::{Director, DirectorOptions, OutboundBody, OutboundHead, OutboundRequest, RewriteError};
