//! The transport seam between the decoding core and the network.
//!
//! The decoding functions never perform I/O: they take response bodies that
//! were already fetched. Fetching is done by a [`CalDavTransport`], which
//! hosts implement with whatever authenticated HTTP stack they have. The
//! crate ships [`HttpTransport`](crate::caldav::HttpTransport) behind the
//! `http` feature.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::error::ProviderResult;

/// A boxed future that is Send.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Content type sent with every CalDAV request body.
pub const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";

/// WebDAV methods used by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DavMethod {
    Propfind,
    Report,
}

impl DavMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Propfind => "PROPFIND",
            Self::Report => "REPORT",
        }
    }
}

impl fmt::Display for DavMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single CalDAV request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalDavRequest {
    pub method: DavMethod,
    pub url: String,
    /// Value of the `Depth` header.
    pub depth: u8,
    /// XML request body.
    pub body: String,
}

impl CalDavRequest {
    /// Creates a PROPFIND request.
    pub fn propfind(url: impl Into<String>, depth: u8, body: impl Into<String>) -> Self {
        Self {
            method: DavMethod::Propfind,
            url: url.into(),
            depth,
            body: body.into(),
        }
    }

    /// Creates a REPORT request. Calendar queries always use `Depth: 1`.
    pub fn report(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            method: DavMethod::Report,
            url: url.into(),
            depth: 1,
            body: body.into(),
        }
    }

    /// The headers to send with this request.
    pub fn headers(&self) -> [(&'static str, String); 2] {
        [
            ("Depth", self.depth.to_string()),
            ("Content-Type", XML_CONTENT_TYPE.to_string()),
        ]
    }
}

/// Sends authenticated CalDAV requests and returns raw response bodies.
///
/// Implementations map HTTP and authentication failures onto
/// [`ProviderError`](crate::ProviderError) codes. Retrying is up to the
/// implementation; callers never retry.
pub trait CalDavTransport: Send + Sync {
    /// Sends the request and returns the response body text.
    fn send(&self, request: CalDavRequest) -> BoxFuture<'_, ProviderResult<String>>;
}

impl<T: CalDavTransport + ?Sized> CalDavTransport for std::sync::Arc<T> {
    fn send(&self, request: CalDavRequest) -> BoxFuture<'_, ProviderResult<String>> {
        (**self).send(request)
    }
}
