//! Authentication commands.

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use gwcli_auth::{AuthStatus, Authenticator, AuthorizeMode, ClientSecret, TerminalPrompt};

use crate::commands::write_json;
use crate::error::ClientResult;
use crate::settings::Settings;

fn authenticator(settings: &Settings) -> ClientResult<Authenticator> {
    Ok(Authenticator::new(
        settings.credential_store(),
        settings.auth_config()?,
    )?)
}

/// Validates a Google Cloud Console credentials file and installs it as
/// `client_secret.json`.
pub fn setup(settings: &Settings, credentials_file: &Path, out: &mut dyn Write) -> ClientResult<()> {
    let secret = ClientSecret::from_file(credentials_file)?;
    let store = settings.credential_store();
    store.save_client_secret(&secret)?;

    info!("client credentials installed from {}", credentials_file.display());
    writeln!(
        out,
        "Client credentials saved to {}",
        store.dir().client_secret_path().display()
    )?;
    writeln!(out, "Run `gwcli auth login` to authorize access.")?;
    Ok(())
}

/// Runs the browser authorization flow unless a usable token already covers
/// the requested scopes.
pub fn login(
    settings: &Settings,
    scopes: Vec<String>,
    manual: bool,
    force: bool,
    out: &mut dyn Write,
) -> ClientResult<()> {
    let auth = authenticator(settings)?;
    let scopes = if scopes.is_empty() {
        auth.config().scopes.clone()
    } else {
        scopes
    };

    let status = auth.status()?;
    if !force && status.is_usable() && scopes.iter().all(|s| status.scopes.contains(s)) {
        writeln!(out, "Already authenticated.")?;
        writeln!(out, "Use --force to re-authenticate.")?;
        return Ok(());
    }

    let mode = if manual {
        AuthorizeMode::Manual
    } else {
        AuthorizeMode::Auto
    };
    let credentials = auth.authenticate(&scopes, mode, &mut TerminalPrompt)?;

    writeln!(out, "Authentication successful!")?;
    writeln!(
        out,
        "Token saved to {}",
        auth.store().dir().token_path().display()
    )?;
    if let Some(expiry) = credentials.expiry() {
        writeln!(out, "Access token valid until {}", expiry.to_rfc3339())?;
    }
    Ok(())
}

pub fn refresh(settings: &Settings, out: &mut dyn Write) -> ClientResult<()> {
    let credentials = authenticator(settings)?.refresh_token()?;
    match credentials.expiry() {
        Some(expiry) => writeln!(out, "Token refreshed, valid until {}", expiry.to_rfc3339())?,
        None => writeln!(out, "Token refreshed.")?,
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct StatusReport<'a> {
    config_dir: String,
    client_secret: bool,
    token: bool,
    fresh: bool,
    refresh_token: bool,
    usable: bool,
    expiry: Option<String>,
    scopes: &'a [String],
}

impl<'a> StatusReport<'a> {
    fn new(settings: &Settings, status: &'a AuthStatus) -> Self {
        Self {
            config_dir: settings.dir().root().display().to_string(),
            client_secret: status.has_client_secret,
            token: status.has_token,
            fresh: status.fresh,
            refresh_token: status.has_refresh_token,
            usable: status.is_usable(),
            expiry: status.expiry.map(|e| e.to_rfc3339()),
            scopes: &status.scopes,
        }
    }
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

pub fn status(settings: &Settings, json: bool, out: &mut dyn Write) -> ClientResult<()> {
    let status = authenticator(settings)?.status()?;
    let report = StatusReport::new(settings, &status);
    if json {
        return write_json(out, &report);
    }

    writeln!(out, "Config directory: {}", report.config_dir)?;
    writeln!(out, "Client secret:    {}", yes_no(report.client_secret))?;
    writeln!(out, "Token:            {}", yes_no(report.token))?;
    if report.token {
        let state = match (report.fresh, report.refresh_token) {
            (true, _) => "fresh",
            (false, true) => "expired (will refresh)",
            (false, false) => "expired",
        };
        writeln!(out, "Access token:     {}", state)?;
        if let Some(expiry) = &report.expiry {
            writeln!(out, "Expires:          {}", expiry)?;
        }
        writeln!(out, "Refresh token:    {}", yes_no(report.refresh_token))?;
        writeln!(out, "Scopes:           {}", report.scopes.join(" "))?;
    }
    if !report.usable {
        let hint = if report.client_secret {
            "run `gwcli auth login`"
        } else {
            "run `gwcli auth setup --credentials-file PATH`"
        };
        writeln!(out, "Not authenticated; {}.", hint)?;
    }
    Ok(())
}

pub fn logout(settings: &Settings, out: &mut dyn Write) -> ClientResult<()> {
    if authenticator(settings)?.logout()? {
        writeln!(out, "Logged out; stored token deleted.")?;
    } else {
        writeln!(out, "Not logged in.")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use gwcli_auth::TokenRecord;

    fn settings() -> (tempfile::TempDir, Settings) {
        let tmp = tempfile::tempdir().unwrap();
        let settings = Settings::new(Some(tmp.path().to_path_buf()));
        (tmp, settings)
    }

    fn output(run: impl FnOnce(&mut Vec<u8>) -> ClientResult<()>) -> String {
        let mut buf = Vec::new();
        run(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn store_token(settings: &Settings, refresh: bool, expires_in: i64) {
        let record = TokenRecord {
            access_token: "ya29.test".to_string(),
            refresh_token: refresh.then(|| "1//refresh".to_string()),
            token_uri: "https://oauth2.googleapis.com/token".to_string(),
            client_id: "id.apps.googleusercontent.com".to_string(),
            client_secret: "secret".to_string(),
            scopes: vec![gwcli_auth::CONTACTS_READONLY_SCOPE.to_string()],
            expiry: Some(Utc::now() + Duration::seconds(expires_in)),
        };
        settings.credential_store().save_token(&record).unwrap();
    }

    #[test]
    fn setup_installs_client_secret() {
        let (tmp, settings) = settings();
        let creds_path = tmp.path().join("download.json");
        std::fs::write(
            &creds_path,
            r#"{"installed":{"client_id":"file-id.apps.googleusercontent.com","client_secret":"file-secret"}}"#,
        )
        .unwrap();

        let text = output(|out| setup(&settings, &creds_path, out));
        assert!(text.contains("client_secret.json"));

        let secret = settings.credential_store().load_client_secret().unwrap();
        assert_eq!(secret.client_id, "file-id.apps.googleusercontent.com");
        assert_eq!(secret.client_secret, "file-secret");
    }

    #[test]
    fn setup_rejects_missing_file() {
        let (tmp, settings) = settings();
        let err = setup(&settings, &tmp.path().join("nope.json"), &mut Vec::new()).unwrap_err();
        assert!(!err.to_string().is_empty());
        assert!(!settings.credential_store().has_client_secret());
    }

    #[test]
    fn login_is_a_no_op_with_usable_token() {
        let (_tmp, settings) = settings();
        store_token(&settings, true, 3600);

        let text = output(|out| login(&settings, Vec::new(), true, false, out));
        assert!(text.contains("Already authenticated"));
    }

    #[test]
    fn refresh_without_refresh_token_fails() {
        let (_tmp, settings) = settings();
        store_token(&settings, false, -10);

        let err = refresh(&settings, &mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("no refresh token"));
    }

    #[test]
    fn status_without_anything_stored() {
        let (_tmp, settings) = settings();
        let text = output(|out| status(&settings, false, out));
        assert!(text.contains("Client secret:    no"));
        assert!(text.contains("gwcli auth setup"));
    }

    #[test]
    fn status_as_json() {
        let (_tmp, settings) = settings();
        store_token(&settings, true, -10);

        let text = output(|out| status(&settings, true, out));
        let report: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(report["token"], true);
        assert_eq!(report["fresh"], false);
        assert_eq!(report["usable"], true);
        assert_eq!(report["scopes"][0], gwcli_auth::CONTACTS_READONLY_SCOPE);
    }

    #[test]
    fn logout_twice() {
        let (_tmp, settings) = settings();
        store_token(&settings, true, 3600);

        assert!(output(|out| logout(&settings, out)).contains("Logged out"));
        assert!(output(|out| logout(&settings, out)).contains("Not logged in"));
    }
}
