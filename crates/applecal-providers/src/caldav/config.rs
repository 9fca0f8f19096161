//! CalDAV provider configuration.

use std::time::Duration;
use url::Url;

use super::auth::Credentials;
use super::principal::PrincipalMatcher;
use crate::error::{ProviderError, ProviderResult};

const CALENDARS_SEGMENT: &str = "calendars";

/// Configuration for the Apple calendar provider.
#[derive(Debug, Clone)]
pub struct CalDavConfig {
    /// Base URL of the CalDAV server. Principal discovery is sent here.
    pub url: Url,

    /// Basic authentication credentials.
    pub credentials: Option<Credentials>,

    /// Whether to verify TLS certificates.
    pub verify_tls: bool,

    /// Request timeout.
    pub timeout: Duration,

    /// User agent string.
    pub user_agent: String,

    /// Which href segment is the principal id.
    pub principal_matcher: PrincipalMatcher,
}

impl CalDavConfig {
    /// iCloud CalDAV endpoint.
    pub const ICLOUD_URL: &'static str = "https://caldav.icloud.com/";

    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Creates a configuration for the given server URL.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the URL does not parse or is not an
    /// http(s) URL.
    pub fn new(url: impl AsRef<str>) -> ProviderResult<Self> {
        let raw = url.as_ref();
        let parsed = Url::parse(raw).map_err(|e| {
            ProviderError::configuration(format!("invalid server URL {raw:?}: {e}")).with_source(e)
        })?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.cannot_be_a_base() {
            return Err(ProviderError::configuration(format!(
                "server URL must be http(s): {raw:?}"
            )));
        }

        Ok(Self {
            url: parsed,
            credentials: None,
            verify_tls: true,
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("applecal/{}", env!("CARGO_PKG_VERSION")),
            principal_matcher: PrincipalMatcher::icloud(),
        })
    }

    /// Configuration for iCloud.
    pub fn icloud() -> ProviderResult<Self> {
        Self::new(Self::ICLOUD_URL)
    }

    /// Sets the credentials for authentication.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some(Credentials::new(username, password));
        self
    }

    /// Disables TLS verification (for testing only).
    pub fn with_insecure_tls(mut self) -> Self {
        self.verify_tls = false;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the user agent string.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Sets the principal id pattern.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the pattern does not compile.
    pub fn with_principal_pattern(self, pattern: &str) -> ProviderResult<Self> {
        Ok(self.with_principal_matcher(PrincipalMatcher::new(pattern)?))
    }

    pub fn with_principal_matcher(mut self, matcher: PrincipalMatcher) -> Self {
        self.principal_matcher = matcher;
        self
    }

    /// Returns the base URL as a string.
    pub fn url_str(&self) -> &str {
        self.url.as_str()
    }

    /// Returns true if credentials are configured.
    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// `{base}/{principal}/calendars/`
    pub fn calendars_url(&self, principal: &str) -> ProviderResult<Url> {
        self.collection_url(&[principal, CALENDARS_SEGMENT])
    }

    /// `{base}/{principal}/calendars/{calendar_id}/`
    ///
    /// `calendar_id` is used verbatim as one path segment; it is
    /// percent-encoded here, so pass it decoded.
    pub fn calendar_url(&self, principal: &str, calendar_id: &str) -> ProviderResult<Url> {
        self.collection_url(&[principal, CALENDARS_SEGMENT, calendar_id])
    }

    fn collection_url(&self, segments: &[&str]) -> ProviderResult<Url> {
        let mut url = self.url.clone();
        url.set_query(None);
        url.set_fragment(None);
        {
            let mut path = url.path_segments_mut().map_err(|()| {
                ProviderError::configuration(format!("server URL cannot be a base: {}", self.url))
            })?;
            path.pop_if_empty().extend(segments).push("");
        }
        Ok(url)
    }
}
