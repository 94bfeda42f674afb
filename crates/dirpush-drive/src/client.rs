//! Google Drive API client
//!
//! Provides a typed HTTP client for the Drive v2 REST API. Handles the
//! bearer token, endpoint construction, and mapping of non-success statuses
//! to [`DriveError`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dirpush_drive::client::DriveClient;
//! use reqwest::Method;
//!
//! # async fn example() -> Result<(), dirpush_drive::DriveError> {
//! let client = DriveClient::new("access-token-here");
//! let response = client
//!     .execute(client.request(Method::GET, "/drive/v2/about"))
//!     .await?;
//! println!("{}", response.status());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use tracing::{debug, warn};

use crate::DriveError;

/// Base URL for the Google APIs host
const DRIVE_BASE_URL: &str = "https://www.googleapis.com";

/// HTTP client for Drive API calls
///
/// Wraps `reqwest::Client` with authentication headers and base URL
/// construction. Cheap to clone.
#[derive(Debug, Clone)]
pub struct DriveClient {
    /// The underlying HTTP client
    client: Client,
    /// Base URL for API requests, without trailing slash
    base_url: String,
    /// OAuth2 access token
    access_token: String,
}

impl DriveClient {
    /// Creates a new DriveClient with the given access token
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::with_base_url(access_token, DRIVE_BASE_URL)
    }

    /// Creates a new DriveClient with a custom base URL (useful for testing)
    ///
    /// # Arguments
    /// * `access_token` - A valid OAuth2 access token
    /// * `base_url` - Custom base URL for API requests
    pub fn with_base_url(access_token: impl Into<String>, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }

    /// Returns a reference to the current access token
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Returns the base URL for API requests
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Creates an authenticated request builder for the given method and path
    ///
    /// Automatically prepends the base URL and adds the Authorization header.
    ///
    /// # Arguments
    /// * `method` - HTTP method (GET, POST, PUT, DELETE, etc.)
    /// * `path` - API path relative to base URL (e.g., "/drive/v2/files")
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.request_url(method, &url)
    }

    /// Creates an authenticated request builder for an absolute URL
    ///
    /// Used for resumable upload session URIs returned by the server.
    pub fn request_url(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.access_token)
    }

    /// Sends a request and maps any non-success status to a [`DriveError`]
    pub async fn execute(&self, request: RequestBuilder) -> Result<Response, DriveError> {
        let response = request.send().await?;
        if response.status().is_success() {
            return Ok(response);
        }
        Err(error_for_response(response).await)
    }
}

/// Converts a non-success response into a [`DriveError`], consuming the body
pub async fn error_for_response(response: Response) -> DriveError {
    let status = response.status();
    let retry_after = response
        .headers()
        .get("Retry-After")
        .and_then(|v| v.to_str().ok())
        .and_then(parse_retry_after);
    let message = response.text().await.unwrap_or_default();

    debug!(status = status.as_u16(), %message, "Drive request failed");

    match status {
        StatusCode::UNAUTHORIZED => DriveError::Unauthorized(message),
        StatusCode::FORBIDDEN if is_rate_limit_reason(&message) => {
            DriveError::TooManyRequests { retry_after }
        }
        StatusCode::FORBIDDEN => DriveError::Forbidden(message),
        StatusCode::NOT_FOUND => DriveError::NotFound(message),
        StatusCode::TOO_MANY_REQUESTS => DriveError::TooManyRequests { retry_after },
        s if s.is_server_error() => DriveError::ServerError {
            status: s.as_u16(),
            message,
        },
        s => DriveError::Api {
            status: s.as_u16(),
            message,
        },
    }
}

/// Drive reports per-user quota throttling as 403 with one of these reasons
fn is_rate_limit_reason(body: &str) -> bool {
    body.contains("rateLimitExceeded") || body.contains("userRateLimitExceeded")
}

/// Parses a `Retry-After` header value into a Duration
///
/// Accepts delta-seconds or an HTTP-date. Dates in the past or more than an
/// hour away are ignored.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    if let Ok(seconds) = value.trim().parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    if let Ok(date) = chrono::DateTime::parse_from_rfc2822(value.trim()) {
        let now = chrono::Utc::now();
        let target = date.with_timezone(&chrono::Utc);
        if target > now {
            let secs = (target - now).num_seconds();
            if let Ok(secs) = u64::try_from(secs) {
                if secs <= 3600 {
                    return Some(Duration::from_secs(secs));
                }
            }
        }
    }

    warn!(value, "Could not parse Retry-After header");
    None
}
