//! Security utilities for credential protection.
//!
//! # Module Structure
//! - `credentials`: secure credential container with automatic memory zeroing
//!
//! URL redaction lives in [`crate::error::redact_database_url`] so every
//! error constructor can reach it.

mod credentials;

pub use credentials::Credentials;
pub use crate::error::redact_database_url;
