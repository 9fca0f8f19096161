//! HTTP Basic authentication (RFC 7617).
//!
//! iCloud only accepts Basic authentication with the Apple ID e-mail and an
//! app-specific password.

use std::fmt;

/// Username and password for Basic authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Value of the `Authorization` header.
    #[cfg(feature = "http")]
    pub fn authorization_header(&self) -> String {
        basic_auth(&self.username, &self.password)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Generates a Basic authentication header value.
#[cfg(feature = "http")]
pub fn basic_auth(username: &str, password: &str) -> String {
    use base64::Engine;

    let credentials = format!("{}:{}", username, password);
    let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
    format!("Basic {}", encoded)
}
