//! reqwest-based [`CalDavTransport`].
//!
//! Credentials are sent preemptively with every request: iCloud answers an
//! anonymous PROPFIND with 401 and never offers another scheme than Basic.

use reqwest::{Client, Method, Response, StatusCode};
use tracing::{trace, warn};

use crate::error::{ProviderError, ProviderResult};
use crate::transport::{BoxFuture, CalDavRequest, CalDavTransport};

use super::auth::Credentials;
use super::config::CalDavConfig;

/// HTTP transport for CalDAV requests.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    credentials: Option<Credentials>,
}

impl HttpTransport {
    /// Creates a transport from the provider configuration.
    pub fn new(config: &CalDavConfig) -> ProviderResult<Self> {
        let client = Client::builder()
            .danger_accept_invalid_certs(!config.verify_tls)
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| ProviderError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            credentials: config.credentials.clone(),
        })
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    async fn execute(&self, request: CalDavRequest) -> ProviderResult<String> {
        let method = Method::from_bytes(request.method.as_str().as_bytes()).map_err(|_| {
            ProviderError::internal(format!("Invalid HTTP method: {}", request.method))
        })?;

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in request.headers() {
            builder = builder.header(name, value);
        }
        if let Some(ref credentials) = self.credentials {
            builder = builder.header("Authorization", credentials.authorization_header());
        }

        trace!(method = %request.method, url = %request.url, depth = request.depth, "Sending request");

        let response = builder.body(request.body).send().await.map_err(|e| {
            ProviderError::network(format!("Request failed: {}", e))
                .with_url(&request.url)
                .with_source(e)
        })?;

        handle_response(response)
            .await
            .map_err(|e| e.with_url(request.url))
    }
}

impl CalDavTransport for HttpTransport {
    fn send(&self, request: CalDavRequest) -> BoxFuture<'_, ProviderResult<String>> {
        Box::pin(self.execute(request))
    }
}

/// Reads the body of a successful response or turns the status into an error.
async fn handle_response(response: Response) -> ProviderResult<String> {
    let status = response.status();
    trace!(status = %status, "Received response");

    if is_success(status) {
        return response
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("Failed to read response: {}", e)));
    }

    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, body))
}

/// Statuses whose body is handed to the decoders.
fn is_success(status: StatusCode) -> bool {
    matches!(status, StatusCode::OK | StatusCode::MULTI_STATUS)
}

/// Maps a non-success status onto a provider error.
fn status_error(status: StatusCode, body: String) -> ProviderError {
    match status {
        StatusCode::UNAUTHORIZED => ProviderError::authentication(
            "Authentication failed: check the Apple ID and app-specific password",
        ),
        StatusCode::FORBIDDEN => ProviderError::authorization("Access denied to calendar"),
        StatusCode::NOT_FOUND => ProviderError::not_found("Calendar or resource not found"),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::rate_limited("Too many requests to server"),
        s if s.is_server_error() => {
            ProviderError::server(format!("Server error ({}): {}", s, body))
        }
        s => {
            warn!(status = %s, "Unexpected response status");
            ProviderError::invalid_response(format!("Unexpected status {}: {}", s, body))
        }
    }
}
