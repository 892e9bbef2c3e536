//! Google OAuth credential lifecycle for gwcli.
//!
//! - [`CredentialStore`] persists the client secret and the token set
//! - [`Authenticator`] runs the authorization flow and keeps tokens fresh
//! - [`ApiClient`] sends bearer-authenticated requests
//!
//! ```text
//! client_secret.json ──► Authenticator ──► token.json
//!                             │
//!                             ▼
//!                        Credentials ──► ApiClient ──► Google API
//! ```

pub mod api;
pub mod authenticator;
pub mod config;
pub mod oauth;
pub mod secret;
pub mod store;
pub mod token;

pub use api::{ApiClient, ApiResponse};
pub use authenticator::{AuthStatus, Authenticator};
pub use config::{AuthConfig, CONTACTS_READONLY_SCOPE, parse_scopes};
pub use oauth::{
    AuthorizeMode, CodePrompt, OAuthClient, PkceFlow, TerminalPrompt, TokenEndpoint,
    parse_manual_code,
};
pub use secret::ClientSecret;
pub use store::CredentialStore;
pub use token::{Credentials, TokenRecord, TokenResponse};
