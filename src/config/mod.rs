//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, defaults for everything missing)
//!     → command-line values layered on top (cli.rs)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → endpoints and transport built once, shared via Arc
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{finalize_config, load_config, parse_config, ConfigError};
pub use schema::{HostHeaderPolicy, ListenerConfig, ObservabilityConfig, ProxyConfig, TransportConfig, UpstreamConfig};
pub use validation::ValidationError;
