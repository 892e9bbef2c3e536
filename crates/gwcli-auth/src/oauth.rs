//! OAuth 2.0 authorization-code flow with PKCE for Google APIs.
//!
//! The flow prefers a loopback redirect: a one-shot HTTP listener on
//! `127.0.0.1` receives the browser redirect carrying the authorization code.
//! When the listener cannot be bound, the redirect never arrives, or the user
//! asked for it, the code is pasted by hand instead.
//!
//! # Flow Overview
//!
//! 1. Generate a code verifier, its SHA-256 challenge and a random state
//! 2. Bind the loopback listener and build the authorization URL
//! 3. Open the browser on Google's consent page
//! 4. Receive the redirect (or read the pasted code / redirect URL)
//! 5. Exchange the code and verifier for an access and refresh token

use std::borrow::Cow;
use std::io::{self, BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use gwcli_core::{Error, Result};
use rand::Rng as _;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, error, info};
use url::Url;

use crate::secret::ClientSecret;
use crate::token::TokenResponse;

/// Redirect URI registered for the paste-the-code path.
pub const MANUAL_REDIRECT_URI: &str = "http://localhost";

/// The PKCE code verifier length (in bytes, before base64 encoding).
const CODE_VERIFIER_LENGTH: usize = 32;
const STATE_LENGTH: usize = 16;

const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);
/// Upper bound on reading one redirect request from the browser.
const CALLBACK_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// How the authorization code is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthorizeMode {
    /// Loopback redirect, falling back to a pasted code.
    #[default]
    Auto,
    /// Always ask for a pasted code.
    Manual,
}

/// PKCE flow state (RFC 7636).
#[derive(Debug)]
pub struct PkceFlow {
    pub verifier: String,
    pub challenge: String,
    /// Random value echoed back by the redirect, compared to reject forged callbacks.
    pub state: String,
}

impl PkceFlow {
    pub fn new() -> Self {
        let verifier = random_urlsafe(CODE_VERIFIER_LENGTH);
        let challenge = Self::compute_challenge(&verifier);
        Self {
            verifier,
            challenge,
            state: random_urlsafe(STATE_LENGTH),
        }
    }

    fn compute_challenge(verifier: &str) -> String {
        let digest = Sha256::digest(verifier.as_bytes());
        URL_SAFE_NO_PAD.encode(digest)
    }

    /// Builds the consent-page URL for `secret`'s authorization endpoint.
    pub fn build_auth_url(
        &self,
        secret: &ClientSecret,
        redirect_uri: &str,
        scopes: &[String],
    ) -> Result<String> {
        let mut url = Url::parse(&secret.auth_uri).map_err(|e| {
            Error::config(format!("invalid auth_uri '{}'", secret.auth_uri)).with_source(e)
        })?;
        url.query_pairs_mut()
            .append_pair("client_id", &secret.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &scopes.join(" "))
            .append_pair("code_challenge", &self.challenge)
            .append_pair("code_challenge_method", "S256")
            .append_pair("state", &self.state)
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent");
        Ok(url.into())
    }
}

impl Default for PkceFlow {
    fn default() -> Self {
        Self::new()
    }
}

fn random_urlsafe(len: usize) -> String {
    let mut rng = rand::rng();
    let bytes: Vec<u8> = (0..len).map(|_| rng.random()).collect();
    URL_SAFE_NO_PAD.encode(&bytes)
}

/// The token endpoint, as seen by the authenticator.
pub trait TokenEndpoint {
    /// Trades an authorization code for a token set.
    fn exchange_code(
        &self,
        secret: &ClientSecret,
        code: &str,
        verifier: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse>;

    /// Obtains a new access token from a refresh token.
    fn refresh(&self, secret: &ClientSecret, refresh_token: &str) -> Result<TokenResponse>;
}

/// [`TokenEndpoint`] over HTTPS.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    http_client: reqwest::blocking::Client,
}

#[derive(Debug, Deserialize)]
struct TokenErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

impl OAuthClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http_client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config("failed to create HTTP client").with_source(e))?;
        Ok(Self { http_client })
    }

    fn post_form(
        &self,
        token_uri: &str,
        params: &[(&str, &str)],
        operation: &str,
    ) -> Result<TokenResponse> {
        debug!("POST {} ({})", token_uri, operation);
        let response = self
            .http_client
            .post(token_uri)
            .form(params)
            .send()
            .map_err(|e| Error::api(format!("{} request failed", operation)).with_source(e))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| Error::api("failed to read token response").with_source(e))?;

        if status.is_client_error() {
            return Err(Error::authentication(format!(
                "{} rejected: {}; re-run `gwcli auth login`",
                operation,
                describe_token_error(&body)
            ))
            .with_status(status.as_u16()));
        }
        if !status.is_success() {
            return Err(Error::api(format!(
                "{} failed: {}",
                operation,
                describe_token_error(&body)
            ))
            .with_status(status.as_u16()));
        }

        serde_json::from_str(&body)
            .map_err(|e| Error::api("invalid token endpoint response").with_source(e))
    }
}

impl TokenEndpoint for OAuthClient {
    fn exchange_code(
        &self,
        secret: &ClientSecret,
        code: &str,
        verifier: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse> {
        let params = [
            ("client_id", secret.client_id.as_str()),
            ("client_secret", secret.client_secret.as_str()),
            ("code", code),
            ("code_verifier", verifier),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri),
        ];
        let response = self.post_form(&secret.token_uri, &params, "token exchange")?;
        info!("obtained tokens");
        Ok(response)
    }

    fn refresh(&self, secret: &ClientSecret, refresh_token: &str) -> Result<TokenResponse> {
        let params = [
            ("client_id", secret.client_id.as_str()),
            ("client_secret", secret.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];
        let response = self.post_form(&secret.token_uri, &params, "token refresh")?;
        info!("refreshed access token");
        Ok(response)
    }
}

fn describe_token_error(body: &str) -> String {
    match serde_json::from_str::<TokenErrorBody>(body) {
        Ok(TokenErrorBody {
            error,
            error_description: Some(description),
        }) => format!("{} ({})", error, description),
        Ok(TokenErrorBody { error, .. }) => error,
        Err(_) => body.trim().chars().take(200).collect(),
    }
}

/// Query parameters carried by an authorization redirect.
#[derive(Debug, Default, PartialEq, Eq)]
struct RedirectParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

impl RedirectParams {
    fn from_query(query: &str) -> Self {
        let mut params = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "code" => params.code = Some(value.into_owned()),
                "state" => params.state = Some(value.into_owned()),
                "error" => params.error = Some(value.into_owned()),
                _ => {}
            }
        }
        params
    }

    /// Checks the redirect against the flow and returns the code.
    ///
    /// A redirect from the loopback listener must carry the state; a pasted
    /// URL is only checked when it does.
    fn into_code(self, expected_state: &str, require_state: bool) -> Result<String> {
        if let Some(error) = self.error {
            return Err(Error::authentication(format!(
                "authorization denied: {}",
                error
            )));
        }
        match self.state.as_deref() {
            Some(state) if state != expected_state => {
                return Err(Error::authentication(
                    "OAuth state mismatch; restart `gwcli auth login`",
                ));
            }
            None if require_state => {
                return Err(Error::authentication("OAuth redirect carried no state"));
            }
            _ => {}
        }
        self.code
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| Error::authentication("missing authorization code in redirect"))
    }
}

/// Result of waiting on the loopback listener.
#[derive(Debug, PartialEq, Eq)]
pub enum CallbackOutcome {
    Code(String),
    TimedOut,
}

/// One-shot HTTP listener on `127.0.0.1` receiving the OAuth redirect.
#[derive(Debug)]
pub struct LoopbackServer {
    listener: TcpListener,
    port: u16,
}

impl LoopbackServer {
    /// Binds the first free port of `port_range`, or an ephemeral port.
    pub fn bind(port_range: Option<(u16, u16)>) -> Result<Self> {
        let Some((start, end)) = port_range else {
            let listener = TcpListener::bind(("127.0.0.1", 0)).map_err(|e| {
                Error::config("failed to bind loopback listener").with_source(e)
            })?;
            let port = listener
                .local_addr()
                .map_err(|e| Error::config("failed to read loopback address").with_source(e))?
                .port();
            debug!("bound loopback server on port {}", port);
            return Ok(Self { listener, port });
        };

        for port in start..=end {
            if let Ok(listener) = TcpListener::bind(("127.0.0.1", port)) {
                debug!("bound loopback server on port {}", port);
                return Ok(Self { listener, port });
            }
        }
        Err(Error::config(format!(
            "no available port in range {}-{}",
            start, end
        )))
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn redirect_uri(&self) -> String {
        format!("http://127.0.0.1:{}/", self.port)
    }

    /// Waits up to `timeout` for the redirect and validates it.
    ///
    /// A denied consent or a state mismatch is an error; only the timeout is
    /// reported as [`CallbackOutcome::TimedOut`]. The listener is closed when
    /// this returns, so a redirect arriving later is refused.
    pub fn wait_for_code(self, expected_state: &str, timeout: Duration) -> Result<CallbackOutcome> {
        self.listener
            .set_nonblocking(true)
            .map_err(|e| Error::config("failed to configure loopback listener").with_source(e))?;
        let deadline = Instant::now() + timeout;

        loop {
            match self.listener.accept() {
                Ok((stream, _)) => {
                    if let Some(params) = handle_callback(stream) {
                        return params.into_code(expected_state, true).map(CallbackOutcome::Code);
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                Err(e) => error!("failed to accept connection: {}", e),
            }

            let now = Instant::now();
            if now >= deadline {
                debug!("no redirect on port {} before the deadline", self.port);
                return Ok(CallbackOutcome::TimedOut);
            }
            thread::sleep(ACCEPT_POLL_INTERVAL.min(deadline - now));
        }
    }
}

/// Reads one request. Returns `None` for requests that are not the redirect
/// (a favicon probe, say) so the listener keeps waiting.
fn handle_callback(mut stream: TcpStream) -> Option<RedirectParams> {
    // accepted sockets inherit non-blocking mode on some platforms
    stream.set_nonblocking(false).ok()?;
    stream.set_read_timeout(Some(CALLBACK_READ_TIMEOUT)).ok()?;
    let mut request_line = String::new();
    {
        let mut reader = BufReader::new(&stream);
        reader.read_line(&mut request_line).ok()?;
        // drain headers so closing the socket does not reset the connection
        let mut header = String::new();
        while matches!(reader.read_line(&mut header), Ok(n) if n > 0) && !header.trim().is_empty()
        {
            header.clear();
        }
    }

    // GET /?code=...&state=... HTTP/1.1
    let mut parts = request_line.split_whitespace();
    let (Some("GET"), Some(target)) = (parts.next(), parts.next()) else {
        return None;
    };
    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    if path != "/" && path != "/callback" {
        let _ = stream.write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n");
        return None;
    }

    let params = RedirectParams::from_query(query);
    if params.code.is_none() && params.error.is_none() {
        // a reload or a stray request; keep waiting for the real redirect
        let _ = stream.write_all(
            b"HTTP/1.1 400 Bad Request\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n\
            <html><body><p>Waiting for the authorization redirect.</p></body></html>",
        );
        return None;
    }
    let response: &[u8] = if params.error.is_some() {
        b"HTTP/1.1 400 Bad Request\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n\
        <html><body><h1>Authorization Failed</h1>\
        <p>You can close this window.</p></body></html>"
    } else {
        b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n\
        <html><body><h1>Authorization Successful</h1>\
        <p>You can close this window and return to the terminal.</p></body></html>"
    };
    let _ = stream.write_all(response);
    let _ = stream.flush();
    Some(params)
}

/// Extracts the authorization code from what the user pasted: either the
/// bare code, the query string, or the whole redirect URL.
pub fn parse_manual_code(input: &str, expected_state: &str) -> Result<String> {
    let input = input.trim();
    if input.is_empty() {
        return Err(Error::authentication("authorization code is empty"));
    }

    if input.starts_with("http://") || input.starts_with("https://") {
        let url = Url::parse(input).map_err(|e| {
            Error::authentication("could not parse the pasted redirect URL").with_source(e)
        })?;
        return RedirectParams::from_query(url.query().unwrap_or_default())
            .into_code(expected_state, false);
    }

    if input.contains("code=") {
        return RedirectParams::from_query(input.trim_start_matches('?'))
            .into_code(expected_state, false);
    }

    Ok(urlencoding::decode(input)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| input.to_string()))
}

/// Source of a pasted authorization code.
pub trait CodePrompt {
    /// Shows `auth_url` and returns whatever the user typed.
    fn read_code(&mut self, auth_url: &str) -> Result<String>;
}

/// Prompts on stderr and reads one line from stdin.
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl CodePrompt for TerminalPrompt {
    fn read_code(&mut self, auth_url: &str) -> Result<String> {
        let mut stderr = std::io::stderr();
        let _ = writeln!(
            stderr,
            "\nOpen this URL in a browser and grant access:\n\n{}\n",
            auth_url
        );
        let _ = write!(
            stderr,
            "Paste the authorization code (or the full redirect URL): "
        );
        let _ = stderr.flush();

        let mut line = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| Error::authentication("failed to read authorization code").with_source(e))?;
        Ok(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gwcli_core::ErrorKind;
    use std::io::Read;

    fn secret(server_url: &str) -> ClientSecret {
        ClientSecret::new("cid", "csecret").with_token_uri(format!("{}/token", server_url))
    }

    #[test]
    fn pkce_verifier_length() {
        // 32 bytes base64url without padding
        assert_eq!(PkceFlow::new().verifier.len(), 43);
    }

    #[test]
    fn pkce_challenge_is_base64url_sha256() {
        // SHA-256("abc") = ba7816bf 8f01cfea 414140de ... f20015ad (FIPS 180-2)
        assert_eq!(
            PkceFlow::compute_challenge("abc"),
            "ungWv48Bz-pBQUDeXa4iI7ADYaOWF3qctBD_YfIAFa0"
        );
        assert_eq!(
            PkceFlow::compute_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r7wW1gFWFOEjXk"),
            "bwWFMyPfdG9qreDhH2lmftFx_dFeLDalzcT1gb_j68g"
        );
    }

    #[test]
    fn pkce_state_is_random() {
        assert_ne!(PkceFlow::new().state, PkceFlow::new().state);
    }

    #[test]
    fn auth_url_format() {
        let flow = PkceFlow::new();
        let url = flow
            .build_auth_url(
                &ClientSecret::new("test-client.apps.googleusercontent.com", "s"),
                "http://127.0.0.1:8080/",
                &[
                    "https://www.googleapis.com/auth/contacts.readonly".to_string(),
                    "openid".to_string(),
                ],
            )
            .unwrap();

        let parsed = Url::parse(&url).unwrap();
        let pairs: std::collections::HashMap<_, _> = parsed.query_pairs().into_owned().collect();
        assert!(url.starts_with(crate::secret::GOOGLE_AUTH_URI));
        assert_eq!(pairs["client_id"], "test-client.apps.googleusercontent.com");
        assert_eq!(pairs["redirect_uri"], "http://127.0.0.1:8080/");
        assert_eq!(
            pairs["scope"],
            "https://www.googleapis.com/auth/contacts.readonly openid"
        );
        assert_eq!(pairs["code_challenge_method"], "S256");
        assert_eq!(pairs["state"], flow.state);
        assert_eq!(pairs["access_type"], "offline");
        assert_eq!(pairs["prompt"], "consent");
    }

    #[test]
    fn manual_code_forms() {
        assert_eq!(parse_manual_code("  4/0Abc  \n", "st").unwrap(), "4/0Abc");
        assert_eq!(parse_manual_code("4%2F0Abc", "st").unwrap(), "4/0Abc");
        assert_eq!(
            parse_manual_code("http://localhost/?state=st&code=4%2Fxyz&scope=a", "st").unwrap(),
            "4/xyz"
        );
        assert_eq!(
            parse_manual_code("code=abc&state=st", "st").unwrap(),
            "abc"
        );
        // no state in a pasted URL is accepted
        assert_eq!(
            parse_manual_code("http://localhost/?code=abc", "st").unwrap(),
            "abc"
        );
    }

    #[test]
    fn manual_code_rejections() {
        for input in ["", "   ", "\n"] {
            let err = parse_manual_code(input, "st").unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Authentication);
        }
        let err = parse_manual_code("http://localhost/?code=abc&state=other", "st").unwrap_err();
        assert!(err.message().contains("state mismatch"));
        let err = parse_manual_code("http://localhost/?error=access_denied", "st").unwrap_err();
        assert!(err.message().contains("access_denied"));
    }

    fn send_request(port: u16, target: &str) -> String {
        let mut stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
        write!(stream, "GET {} HTTP/1.1\r\nHost: 127.0.0.1\r\n\r\n", target).unwrap();
        let mut response = String::new();
        let _ = stream.read_to_string(&mut response);
        response
    }

    #[test]
    fn loopback_receives_code() {
        let server = LoopbackServer::bind(None).unwrap();
        let port = server.port();
        assert_eq!(server.redirect_uri(), format!("http://127.0.0.1:{}/", port));

        let client = thread::spawn(move || {
            let favicon = send_request(port, "/favicon.ico");
            let redirect = send_request(port, "/?state=expected&code=4%2Fabc");
            (favicon, redirect)
        });

        let outcome = server
            .wait_for_code("expected", Duration::from_secs(5))
            .unwrap();
        assert_eq!(outcome, CallbackOutcome::Code("4/abc".to_string()));

        let (favicon, redirect) = client.join().unwrap();
        assert!(favicon.starts_with("HTTP/1.1 404"));
        assert!(redirect.starts_with("HTTP/1.1 200"));
    }

    #[test]
    fn loopback_state_mismatch_is_error() {
        let server = LoopbackServer::bind(None).unwrap();
        let port = server.port();
        let client = thread::spawn(move || send_request(port, "/callback?state=forged&code=x"));

        let err = server
            .wait_for_code("expected", Duration::from_secs(5))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authentication);
        client.join().unwrap();
    }

    #[test]
    fn loopback_denied_is_error() {
        let server = LoopbackServer::bind(None).unwrap();
        let port = server.port();
        let client = thread::spawn(move || send_request(port, "/?error=access_denied&state=s"));

        let err = server.wait_for_code("s", Duration::from_secs(5)).unwrap_err();
        assert!(err.message().contains("access_denied"));
        assert!(client.join().unwrap().starts_with("HTTP/1.1 400"));
    }

    #[test]
    fn loopback_times_out() {
        let server = LoopbackServer::bind(None).unwrap();
        let outcome = server
            .wait_for_code("s", Duration::from_millis(20))
            .unwrap();
        assert_eq!(outcome, CallbackOutcome::TimedOut);
    }

    #[test]
    fn loopback_refuses_redirect_after_timeout() {
        let server = LoopbackServer::bind(None).unwrap();
        let port = server.port();
        let outcome = server
            .wait_for_code("s", Duration::from_millis(20))
            .unwrap();
        assert_eq!(outcome, CallbackOutcome::TimedOut);

        thread::sleep(Duration::from_millis(50));
        assert!(TcpStream::connect(("127.0.0.1", port)).is_err());
    }

    #[test]
    fn loopback_ignores_request_without_code() {
        let server = LoopbackServer::bind(None).unwrap();
        let port = server.port();
        let client = thread::spawn(move || {
            let reload = send_request(port, "/");
            let redirect = send_request(port, "/?state=s&code=4%2Fabc");
            (reload, redirect)
        });

        let outcome = server.wait_for_code("s", Duration::from_secs(5)).unwrap();
        assert_eq!(outcome, CallbackOutcome::Code("4/abc".to_string()));

        let (reload, redirect) = client.join().unwrap();
        assert!(reload.starts_with("HTTP/1.1 400"));
        assert!(redirect.starts_with("HTTP/1.1 200"));
    }

    #[test]
    fn loopback_port_range() {
        let first = LoopbackServer::bind(None).unwrap();
        let taken = first.port();
        let err = LoopbackServer::bind(Some((taken, taken))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn exchange_code_posts_form() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/token")
            .match_body(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("grant_type".into(), "authorization_code".into()),
                mockito::Matcher::UrlEncoded("code".into(), "4/abc".into()),
                mockito::Matcher::UrlEncoded("code_verifier".into(), "verifier".into()),
                mockito::Matcher::UrlEncoded("client_id".into(), "cid".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"ya29.new","refresh_token":"1//r","expires_in":3599}"#)
            .create();

        let client = OAuthClient::new(Duration::from_secs(5)).unwrap();
        let response = client
            .exchange_code(&secret(&server.url()), "4/abc", "verifier", "http://127.0.0.1:1/")
            .unwrap();

        mock.assert();
        assert_eq!(response.access_token.as_deref(), Some("ya29.new"));
        assert_eq!(response.refresh_token.as_deref(), Some("1//r"));
    }

    #[test]
    fn refresh_rejection_is_authentication_error() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/token")
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant","error_description":"Token has been expired or revoked."}"#)
            .create();

        let client = OAuthClient::new(Duration::from_secs(5)).unwrap();
        let err = client.refresh(&secret(&server.url()), "1//r").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert_eq!(err.status(), Some(400));
        assert!(err.message().contains("invalid_grant"));
    }

    #[test]
    fn server_error_is_api_error() {
        let mut server = mockito::Server::new();
        server.mock("POST", "/token").with_status(503).create();

        let client = OAuthClient::new(Duration::from_secs(5)).unwrap();
        let err = client.refresh(&secret(&server.url()), "1//r").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn unreachable_endpoint_is_api_error() {
        let client = OAuthClient::new(Duration::from_secs(2)).unwrap();
        let err = client
            .refresh(&secret("http://127.0.0.1:1"), "1//r")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Api);
    }
}
