//! OAuth token records and the credentials handed to API callers.

use chrono::{DateTime, Duration, Utc};
use gwcli_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::secret::ClientSecret;

/// A token is treated as stale this long before its reported expiry.
pub const EXPIRY_SKEW_SECS: i64 = 60;

/// Persisted token set.
///
/// The JSON layout (`token`, `refresh_token`, `token_uri`, `client_id`,
/// `client_secret`, `scopes`, `expiry`) matches what Google's client
/// libraries write, so existing token files can be reused. Every field but
/// `token` may be absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    #[serde(rename = "token")]
    pub access_token: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    #[serde(default)]
    pub token_uri: String,

    #[serde(default)]
    pub client_id: String,

    #[serde(default)]
    pub client_secret: String,

    #[serde(default)]
    pub scopes: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

/// Body returned by the token endpoint for both code exchange and refresh.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Space-separated list of granted scopes.
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl TokenResponse {
    fn granted_scopes(&self) -> Option<Vec<String>> {
        self.scope
            .as_deref()
            .map(|s| s.split_whitespace().map(String::from).collect::<Vec<_>>())
            .filter(|scopes| !scopes.is_empty())
    }

    fn take_access_token(&mut self) -> Result<String> {
        self.access_token
            .take()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::api("token endpoint response contained no access_token"))
    }
}

impl TokenRecord {
    /// Builds a record from a fresh authorization-code grant.
    ///
    /// `requested_scopes` is used when the endpoint does not echo the
    /// granted scopes back.
    pub fn from_grant(
        mut response: TokenResponse,
        secret: &ClientSecret,
        requested_scopes: &[String],
    ) -> Result<Self> {
        let access_token = response.take_access_token()?;
        let scopes = response
            .granted_scopes()
            .unwrap_or_else(|| requested_scopes.to_vec());

        Ok(Self {
            access_token,
            refresh_token: response.refresh_token,
            token_uri: secret.token_uri.clone(),
            client_id: secret.client_id.clone(),
            client_secret: secret.client_secret.clone(),
            scopes,
            expiry: response.expires_in.map(expiry_from_now),
        })
    }

    /// Applies a refresh response in place.
    ///
    /// A response without a `refresh_token` keeps the current one.
    pub fn apply_refresh(&mut self, mut response: TokenResponse) -> Result<()> {
        self.access_token = response.take_access_token()?;
        if let Some(refresh) = response.refresh_token.take().filter(|t| !t.is_empty()) {
            self.refresh_token = Some(refresh);
        }
        if let Some(scopes) = response.granted_scopes() {
            self.scopes = scopes;
        }
        self.expiry = response.expires_in.map(expiry_from_now);
        Ok(())
    }

    /// True while the access token can still be used at `now`.
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => now + Duration::seconds(EXPIRY_SKEW_SECS) < expiry,
            None => true,
        }
    }

    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(Utc::now())
    }

    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub fn has_scopes(&self, required: &[String]) -> bool {
        required.iter().all(|scope| self.scopes.contains(scope))
    }

    pub fn time_until_expiry(&self) -> Option<Duration> {
        self.expiry.map(|expiry| expiry - Utc::now())
    }
}

fn expiry_from_now(expires_in_secs: i64) -> DateTime<Utc> {
    Utc::now() + Duration::seconds(expires_in_secs)
}

/// Bearer credentials handed to API callers.
///
/// The authenticator only hands these out for records that were fresh, or
/// just refreshed, at the time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    record: TokenRecord,
}

impl Credentials {
    pub fn new(record: TokenRecord) -> Self {
        Self { record }
    }

    pub fn access_token(&self) -> &str {
        &self.record.access_token
    }

    pub fn scopes(&self) -> &[String] {
        &self.record.scopes
    }

    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        self.record.expiry
    }

    /// Value for the HTTP `Authorization` header.
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.record.access_token)
    }

    pub fn record(&self) -> &TokenRecord {
        &self.record
    }

    pub fn into_record(self) -> TokenRecord {
        self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> ClientSecret {
        ClientSecret::new("client-id", "client-secret")
    }

    fn response(json: &str) -> TokenResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn grant_with_all_fields() {
        let record = TokenRecord::from_grant(
            response(
                r#"{"access_token":"ya29.a","refresh_token":"1//r","expires_in":3599,
                    "scope":"https://www.googleapis.com/auth/contacts.readonly openid",
                    "token_type":"Bearer"}"#,
            ),
            &secret(),
            &["ignored".to_string()],
        )
        .unwrap();

        assert_eq!(record.access_token, "ya29.a");
        assert_eq!(record.refresh_token.as_deref(), Some("1//r"));
        assert_eq!(record.client_id, "client-id");
        assert_eq!(record.token_uri, crate::secret::GOOGLE_TOKEN_URI);
        assert_eq!(record.scopes.len(), 2);
        assert!(record.is_fresh());
    }

    #[test]
    fn grant_tolerates_missing_optional_fields() {
        let scopes = vec!["scope-a".to_string()];
        let record =
            TokenRecord::from_grant(response(r#"{"access_token":"only"}"#), &secret(), &scopes)
                .unwrap();
        assert_eq!(record.refresh_token, None);
        assert_eq!(record.expiry, None);
        assert_eq!(record.scopes, scopes);
        assert!(record.is_fresh());
    }

    #[test]
    fn grant_without_access_token_fails() {
        let err = TokenRecord::from_grant(response("{}"), &secret(), &[]).unwrap_err();
        assert!(err.message().contains("access_token"));
    }

    #[test]
    fn refresh_keeps_refresh_token_when_omitted() {
        let mut record =
            TokenRecord::from_grant(response(r#"{"access_token":"a","refresh_token":"r"}"#), &secret(), &[])
                .unwrap();
        record
            .apply_refresh(response(r#"{"access_token":"b","expires_in":3600}"#))
            .unwrap();
        assert_eq!(record.access_token, "b");
        assert_eq!(record.refresh_token.as_deref(), Some("r"));
        assert!(record.expiry.is_some());
    }

    #[test]
    fn freshness_uses_skew() {
        let mut record =
            TokenRecord::from_grant(response(r#"{"access_token":"a"}"#), &secret(), &[]).unwrap();
        let now = Utc::now();

        record.expiry = Some(now + Duration::seconds(EXPIRY_SKEW_SECS + 30));
        assert!(record.is_fresh_at(now));

        record.expiry = Some(now + Duration::seconds(EXPIRY_SKEW_SECS - 1));
        assert!(!record.is_fresh_at(now));

        record.expiry = Some(now - Duration::hours(1));
        assert!(!record.is_fresh_at(now));
    }

    #[test]
    fn reads_google_library_layout() {
        let json = r#"{
            "token": "ya29.x",
            "refresh_token": "1//y",
            "token_uri": "https://oauth2.googleapis.com/token",
            "client_id": "cid",
            "client_secret": "cs",
            "scopes": ["https://www.googleapis.com/auth/contacts"],
            "universe_domain": "googleapis.com",
            "expiry": "2030-01-01T00:00:00Z"
        }"#;
        let record: TokenRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.access_token, "ya29.x");
        assert!(record.has_refresh_token());
        assert!(record.has_scopes(&["https://www.googleapis.com/auth/contacts".to_string()]));
        assert!(record.expiry.is_some());
    }

    #[test]
    fn credentials_header() {
        let record =
            TokenRecord::from_grant(response(r#"{"access_token":"abc"}"#), &secret(), &[]).unwrap();
        let creds = Credentials::new(record);
        assert_eq!(creds.authorization_header(), "Bearer abc");
        assert_eq!(creds.access_token(), "abc");
    }
}
