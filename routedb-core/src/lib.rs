//! Core session management for routedb.
//!
//! This crate turns an explicit [`SessionConfig`] into a secured,
//! authenticated connection to a MongoDB-compatible cluster (Amazon
//! DocumentDB in production) and exposes a small set of CRUD primitives,
//! each bounded by a deadline.
//!
//! # Security Guarantees
//! - Credentials live in zeroizing containers and are never logged
//! - Connection URLs are redacted in every log line and error message
//! - TLS certificate validation stays on unless explicitly disabled
//!
//! # Architecture
//! - `config`: immutable connection configuration and URI rendering
//! - `security`: credential storage and URL redaction
//! - `tls`: CA bundle loading and driver TLS options
//! - `session`: connection establishment and timeout-bounded operations
//! - `logging`: subscriber setup shared by binaries

pub mod config;
pub mod error;
pub mod logging;
pub mod security;
pub mod session;
pub mod tls;

// Re-export commonly used types
pub use config::{ReadPreference, SessionConfig};
pub use error::{Result, RouteDbError};
pub use logging::{LogFormat, init_logging};
pub use security::Credentials;
pub use session::Session;

/// Re-export of the driver's BSON module so callers can build filters
/// without depending on `mongodb` directly.
pub use mongodb::bson;
