//! Credential lifecycle: interactive login, loading, refresh and logout.

use chrono::{DateTime, Utc};
use gwcli_core::{Error, Result};
use tracing::{debug, info, warn};

use crate::config::AuthConfig;
use crate::oauth::{
    AuthorizeMode, CallbackOutcome, CodePrompt, LoopbackServer, MANUAL_REDIRECT_URI, OAuthClient,
    PkceFlow, TokenEndpoint, parse_manual_code,
};
use crate::secret::{ClientSecret, GOOGLE_TOKEN_URI};
use crate::store::CredentialStore;
use crate::token::{Credentials, TokenRecord};

/// Snapshot of the stored authentication state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthStatus {
    pub has_client_secret: bool,
    pub has_token: bool,
    pub fresh: bool,
    pub has_refresh_token: bool,
    pub expiry: Option<DateTime<Utc>>,
    pub scopes: Vec<String>,
}

impl AuthStatus {
    /// True when API calls can proceed, possibly after a refresh.
    pub fn is_usable(&self) -> bool {
        self.has_token && (self.fresh || self.has_refresh_token)
    }
}

/// Drives the OAuth flows against a [`CredentialStore`].
///
/// Nothing here ever starts an interactive flow on its own: callers that
/// only need credentials use [`get_credentials`](Self::get_credentials), and
/// a missing token is reported as an authentication error.
#[derive(Debug)]
pub struct Authenticator<E = OAuthClient> {
    store: CredentialStore,
    endpoint: E,
    config: AuthConfig,
}

impl Authenticator<OAuthClient> {
    /// Creates an authenticator talking to the real token endpoint.
    pub fn new(store: CredentialStore, config: AuthConfig) -> Result<Self> {
        let endpoint = OAuthClient::new(config.http_timeout)?;
        Ok(Self::with_endpoint(store, config, endpoint))
    }
}

impl<E: TokenEndpoint> Authenticator<E> {
    pub fn with_endpoint(store: CredentialStore, config: AuthConfig, endpoint: E) -> Self {
        Self {
            store,
            endpoint,
            config,
        }
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Runs the interactive authorization flow and persists the new token.
    ///
    /// In [`AuthorizeMode::Auto`] the loopback redirect is tried first; a
    /// bind failure or a callback timeout falls back to `prompt`. A denied
    /// consent or a state mismatch fails immediately.
    pub fn authenticate(
        &self,
        scopes: &[String],
        mode: AuthorizeMode,
        prompt: &mut dyn CodePrompt,
    ) -> Result<Credentials> {
        let secret = self.store.load_client_secret()?;
        secret.validate()?;
        let scopes = if scopes.is_empty() {
            self.config.scopes.as_slice()
        } else {
            scopes
        };

        let pkce = PkceFlow::new();
        info!("starting authorization for {} scope(s)", scopes.len());

        let loopback = match mode {
            AuthorizeMode::Auto => self.authorize_loopback(&secret, &pkce, scopes)?,
            AuthorizeMode::Manual => None,
        };
        let (code, redirect_uri) = match loopback {
            Some(grant) => grant,
            None => {
                let auth_url = pkce.build_auth_url(&secret, MANUAL_REDIRECT_URI, scopes)?;
                let input = prompt.read_code(&auth_url)?;
                let code = parse_manual_code(&input, &pkce.state)?;
                (code, MANUAL_REDIRECT_URI.to_string())
            }
        };

        info!("received authorization code, exchanging for tokens");
        let response = self
            .endpoint
            .exchange_code(&secret, &code, &pkce.verifier, &redirect_uri)?;
        let record = TokenRecord::from_grant(response, &secret, scopes)?;
        self.store.save_token(&record)?;
        info!("authentication successful");
        Ok(Credentials::new(record))
    }

    /// Returns `Some((code, redirect_uri))`, or `None` when the caller should
    /// fall back to the pasted code.
    fn authorize_loopback(
        &self,
        secret: &ClientSecret,
        pkce: &PkceFlow,
        scopes: &[String],
    ) -> Result<Option<(String, String)>> {
        let server = match LoopbackServer::bind(self.config.loopback_port_range) {
            Ok(server) => server,
            Err(e) => {
                warn!("cannot listen for the OAuth redirect ({}), asking for the code", e);
                return Ok(None);
            }
        };
        let redirect_uri = server.redirect_uri();
        let auth_url = pkce.build_auth_url(secret, &redirect_uri, scopes)?;
        debug!("authorization URL: {}", auth_url);

        eprintln!("\nOpening the browser for authorization. If it does not open, visit:\n\n{}\n", auth_url);
        if self.config.open_browser
            && let Err(e) = open::that(&auth_url)
        {
            warn!("failed to open browser: {}", e);
        }

        match server.wait_for_code(&pkce.state, self.config.callback_timeout)? {
            CallbackOutcome::Code(code) => Ok(Some((code, redirect_uri))),
            CallbackOutcome::TimedOut => {
                warn!(
                    "no redirect within {}s, asking for the code",
                    self.config.callback_timeout.as_secs()
                );
                Ok(None)
            }
        }
    }

    /// Returns usable credentials, refreshing a stale token when possible.
    ///
    /// `scopes` fills the record's scope list when the stored token has none.
    pub fn get_credentials(&self, scopes: &[String]) -> Result<Credentials> {
        let mut record = self.store.load_token()?;
        if record.scopes.is_empty() {
            record.scopes = scopes.to_vec();
        } else if !record.has_scopes(scopes) {
            warn!("stored token lacks some requested scopes; run `gwcli auth login --force`");
        }

        if record.is_fresh() {
            debug!("stored access token is fresh");
            return Ok(Credentials::new(record));
        }

        if !record.has_refresh_token() {
            return Err(Error::authentication(
                "access token expired and no refresh token is stored; run `gwcli auth login`",
            ));
        }

        debug!("access token is stale, refreshing");
        self.refresh_record(&mut record)?;
        Ok(Credentials::new(record))
    }

    /// Refreshes the stored token whether or not it is still fresh.
    pub fn refresh_token(&self) -> Result<Credentials> {
        let mut record = self.store.load_token()?;
        if !record.has_refresh_token() {
            return Err(Error::authentication(
                "no refresh token stored; run `gwcli auth login`",
            ));
        }
        self.refresh_record(&mut record)?;
        Ok(Credentials::new(record))
    }

    fn refresh_record(&self, record: &mut TokenRecord) -> Result<()> {
        let refresh_token = record
            .refresh_token
            .clone()
            .ok_or_else(|| Error::authentication("no refresh token stored"))?;
        let identity = self.refresh_identity(record)?;

        let response = self.endpoint.refresh(&identity, &refresh_token)?;
        record.apply_refresh(response)?;
        self.store.save_token(record)?;
        info!("access token refreshed, expiry {:?}", record.expiry);
        Ok(())
    }

    /// Client identity for a refresh: the one embedded in the record, or the
    /// stored client secret for records written without it.
    fn refresh_identity(&self, record: &mut TokenRecord) -> Result<ClientSecret> {
        if record.client_id.is_empty() || record.client_secret.is_empty() {
            let stored = self.store.load_client_secret()?;
            record.client_id = stored.client_id;
            record.client_secret = stored.client_secret;
            if record.token_uri.is_empty() {
                record.token_uri = stored.token_uri;
            }
        }
        if record.token_uri.is_empty() {
            record.token_uri = GOOGLE_TOKEN_URI.to_string();
        }
        Ok(ClientSecret::new(record.client_id.clone(), record.client_secret.clone())
            .with_token_uri(record.token_uri.clone()))
    }

    pub fn status(&self) -> Result<AuthStatus> {
        let has_client_secret = self.store.has_client_secret();
        if !self.store.has_token() {
            return Ok(AuthStatus {
                has_client_secret,
                has_token: false,
                fresh: false,
                has_refresh_token: false,
                expiry: None,
                scopes: Vec::new(),
            });
        }

        let record = self.store.load_token()?;
        Ok(AuthStatus {
            has_client_secret,
            has_token: true,
            fresh: record.is_fresh(),
            has_refresh_token: record.has_refresh_token(),
            expiry: record.expiry,
            scopes: record.scopes,
        })
    }

    /// Deletes the stored token. Returns false if there was none.
    pub fn logout(&self) -> Result<bool> {
        self.store.delete_token()
    }
}
