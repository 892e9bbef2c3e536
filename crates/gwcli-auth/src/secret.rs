//! OAuth client secret, as downloaded from the Google Cloud Console.

use std::path::Path;

use gwcli_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Google's authorization endpoint.
pub const GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/v2/auth";
/// Google's token endpoint.
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Application identity used for every OAuth exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    GOOGLE_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

/// Shape of the Cloud Console JSON: an `installed` or `web` section, or the
/// flat layout some tools (gcloud) write.
#[derive(Debug, Deserialize)]
struct CredentialsFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
    client_id: Option<String>,
    client_secret: Option<String>,
    auth_uri: Option<String>,
    token_uri: Option<String>,
}

impl ClientSecret {
    /// Creates a client secret that talks to Google's standard endpoints.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            auth_uri: default_auth_uri(),
            token_uri: default_token_uri(),
        }
    }

    /// Points the token exchange at another endpoint.
    pub fn with_token_uri(mut self, token_uri: impl Into<String>) -> Self {
        self.token_uri = token_uri.into();
        self
    }

    /// Reads a Cloud Console credentials file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("failed to read credentials file {}", path.display()))
                .with_source(e)
        })?;
        Self::from_json(&content)
    }

    /// Parses any of the accepted credentials layouts.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: CredentialsFile = serde_json::from_str(json).map_err(|e| {
            Error::config("failed to parse client secret JSON").with_source(e)
        })?;

        if let Some(secret) = file.installed.or(file.web) {
            return Ok(secret);
        }

        match (file.client_id, file.client_secret) {
            (Some(client_id), Some(client_secret)) => Ok(Self {
                client_id,
                client_secret,
                auth_uri: file.auth_uri.unwrap_or_else(default_auth_uri),
                token_uri: file.token_uri.unwrap_or_else(default_token_uri),
            }),
            _ => Err(Error::config(
                "client secret must contain an 'installed'/'web' section or \
                 'client_id'/'client_secret' at the root",
            )),
        }
    }

    /// Checks that the identity looks usable before any network call.
    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(Error::validation("client_id is required"));
        }
        if self.client_secret.trim().is_empty() {
            return Err(Error::validation("client_secret is required"));
        }
        if !self.token_uri.starts_with("http") {
            return Err(Error::validation(format!(
                "token_uri '{}' is not an http(s) URL",
                self.token_uri
            )));
        }
        Ok(())
    }
}
