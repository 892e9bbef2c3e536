//! Authenticated HTTP transport shared by the Google API services.

use std::time::Duration;

use gwcli_core::{Error, Result};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::token::Credentials;

/// Longest body excerpt carried in an error message.
const ERROR_BODY_LIMIT: usize = 500;

/// A completed HTTP exchange, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decodes a successful body, or turns the status into an error.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        if !self.is_success() {
            return Err(self.to_error());
        }
        serde_json::from_str(&self.body).map_err(|e| {
            Error::api("failed to decode API response")
                .with_status(self.status)
                .with_source(e)
        })
    }

    /// Maps a failed status: 401 is an authentication problem, anything
    /// else an API error carrying the body.
    pub fn to_error(&self) -> Error {
        if self.status == 401 {
            return Error::authentication(
                "access token rejected; run `gwcli auth refresh` or `gwcli auth login`",
            )
            .with_status(self.status);
        }
        let excerpt: String = self.body.trim().chars().take(ERROR_BODY_LIMIT).collect();
        Error::api(format!("API request failed: {}", excerpt)).with_status(self.status)
    }
}

/// Issues bearer-authenticated requests with one set of credentials.
///
/// Built once by the entry point and handed to every service.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http_client: reqwest::blocking::Client,
    credentials: Credentials,
}

impl ApiClient {
    pub fn new(credentials: Credentials, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("gwcli/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::config("failed to create HTTP client").with_source(e))?;
        Ok(Self {
            http_client,
            credentials,
        })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Sends a GET. Non-2xx statuses are returned, not raised; transport
    /// failures are [`ErrorKind::Api`](gwcli_core::ErrorKind::Api) errors.
    pub fn get(&self, url: &str, query: &[(&str, String)]) -> Result<ApiResponse> {
        debug!("GET {}", url);
        let response = self
            .http_client
            .get(url)
            .bearer_auth(self.credentials.access_token())
            .query(query)
            .send()
            .map_err(|e| {
                let message = if e.is_timeout() {
                    "request timed out".to_string()
                } else if e.is_connect() {
                    format!("connection to {} failed", url)
                } else {
                    "request failed".to_string()
                };
                Error::api(message).with_source(e)
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| Error::api("failed to read response").with_source(e))?;
        debug!("GET {} -> {}", url, status);
        Ok(ApiResponse { status, body })
    }
}
