//! Settings for the authorization flow and the HTTP transport.

use std::time::Duration;

use gwcli_core::{ConfigStore, Result};

/// Read-only access to the user's contacts.
pub const CONTACTS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/contacts.readonly";

/// Tunables for [`Authenticator`](crate::Authenticator) and [`ApiClient`](crate::ApiClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    /// Scopes requested at login and filled into tokens that carry none.
    pub scopes: Vec<String>,
    /// Ports to try for the loopback callback. `None` lets the OS pick one.
    pub loopback_port_range: Option<(u16, u16)>,
    /// How long to wait for the browser redirect before asking for the code.
    pub callback_timeout: Duration,
    /// Timeout for every HTTP request.
    pub http_timeout: Duration,
    /// Whether to launch a browser for the consent page.
    pub open_browser: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            scopes: vec![CONTACTS_READONLY_SCOPE.to_string()],
            loopback_port_range: None,
            callback_timeout: Duration::from_secs(Self::DEFAULT_CALLBACK_TIMEOUT_SECS),
            http_timeout: Duration::from_secs(Self::DEFAULT_HTTP_TIMEOUT_SECS),
            open_browser: true,
        }
    }
}

impl AuthConfig {
    pub const DEFAULT_CALLBACK_TIMEOUT_SECS: u64 = 300;
    pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

    /// Key holding the default scope list.
    pub const SCOPES_KEY: &'static str = "scopes";
    /// Key holding the callback timeout in seconds.
    pub const CALLBACK_TIMEOUT_KEY: &'static str = "callback_timeout_secs";

    /// Overlays the values stored in the key/value config on the defaults.
    pub fn from_store(store: &ConfigStore) -> Result<Self> {
        let mut config = Self::default();
        if let Some(raw) = store.get(Self::SCOPES_KEY)? {
            let scopes = parse_scopes(&raw);
            if !scopes.is_empty() {
                config.scopes = scopes;
            }
        }
        if let Some(secs) = store.get_parsed::<u64>(Self::CALLBACK_TIMEOUT_KEY)? {
            config.callback_timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        if !scopes.is_empty() {
            self.scopes = scopes;
        }
        self
    }

    pub fn with_loopback_port_range(mut self, start: u16, end: u16) -> Self {
        self.loopback_port_range = Some((start, end));
        self
    }

    pub fn with_callback_timeout(mut self, timeout: Duration) -> Self {
        self.callback_timeout = timeout;
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    pub fn with_open_browser(mut self, open: bool) -> Self {
        self.open_browser = open;
        self
    }
}

/// Splits a scope list on whitespace and commas, dropping duplicates while
/// keeping the first occurrence's position.
pub fn parse_scopes(raw: &str) -> Vec<String> {
    let mut scopes: Vec<String> = Vec::new();
    for scope in raw.split(|c: char| c == ',' || c.is_whitespace()) {
        if !scope.is_empty() && !scopes.iter().any(|s| s == scope) {
            scopes.push(scope.to_string());
        }
    }
    scopes
}
