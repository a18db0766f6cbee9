//! Secure credential container with automatic memory zeroing.
//!
//! # Security
//! - Username and password are stored in `Zeroizing<T>` containers
//! - Memory is cleared when credentials go out of scope
//! - The password never appears in debug output or logs

use zeroize::{Zeroize, Zeroizing};

/// Secure credential container that automatically zeros memory on drop.
///
/// # Example
///
/// ```rust
/// use routedb_core::security::Credentials;
///
/// let creds = Credentials::new("docdb", "prototyperoute");
/// assert_eq!(creds.username(), "docdb");
/// assert!(creds.has_password());
/// assert!(!format!("{creds:?}").contains("prototyperoute"));
/// ```
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct Credentials {
    username: Zeroizing<String>,
    password: Zeroizing<String>,
}

impl Credentials {
    /// Creates new credentials with automatic memory zeroing.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Zeroizing::new(username.into()),
            password: Zeroizing::new(password.into()),
        }
    }

    /// Gets the username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Gets the password.
    ///
    /// Only the URI renderer should need this; never log the result.
    pub(crate) fn password(&self) -> &str {
        &self.password
    }

    /// Checks if a non-empty password is present without exposing it.
    pub fn has_password(&self) -> bool {
        !self.password.is_empty()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username.as_str())
            .field("password", &"****")
            .finish()
    }
}
