//! Resolved settings for one `gwcli` invocation.
//!
//! Everything lives in one directory (`$GWCLI_CONFIG_DIR` or
//! `~/.config/gwcli`). Tunables come from `config.toml`; the known keys are
//! validated on `gwcli config set`, anything else is stored as-is.

use std::path::PathBuf;
use std::time::Duration;

use gwcli_auth::{AuthConfig, CredentialStore, parse_scopes};
use gwcli_core::{ConfigDir, ConfigStore, Error, Result};
use gwcli_people::{ContactCache, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

pub const SCOPES_KEY: &str = AuthConfig::SCOPES_KEY;
pub const SYNC_HOURS_KEY: &str = "sync_hours";
pub const CALLBACK_TIMEOUT_KEY: &str = AuthConfig::CALLBACK_TIMEOUT_KEY;
pub const PAGE_SIZE_KEY: &str = "page_size";

/// Age after which `contacts sync --if-older-than` resyncs by default.
pub const DEFAULT_SYNC_HOURS: u64 = 24;

/// Keys with a meaning, and what each holds.
pub const KNOWN_KEYS: &[(&str, &str)] = &[
    (SCOPES_KEY, "OAuth scopes requested at login (space or comma separated)"),
    (SYNC_HOURS_KEY, "hours before a cached contact list counts as stale"),
    (CALLBACK_TIMEOUT_KEY, "seconds to wait for the browser redirect"),
    (PAGE_SIZE_KEY, "contacts fetched per People API request (1-1000)"),
];

#[derive(Debug, Clone)]
pub struct Settings {
    dir: ConfigDir,
    store: ConfigStore,
}

impl Settings {
    /// Uses `dir` when given (flag or environment), else the platform default.
    pub fn new(dir: Option<PathBuf>) -> Self {
        let dir = dir.map(ConfigDir::new).unwrap_or_else(ConfigDir::from_env);
        let store = ConfigStore::new(dir.config_path());
        Self { dir, store }
    }

    pub fn dir(&self) -> &ConfigDir {
        &self.dir
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn credential_store(&self) -> CredentialStore {
        CredentialStore::new(self.dir.clone())
    }

    pub fn auth_config(&self) -> Result<AuthConfig> {
        AuthConfig::from_store(&self.store)
    }

    pub fn sync_hours(&self) -> Result<u64> {
        Ok(self
            .store
            .get_parsed::<u64>(SYNC_HOURS_KEY)?
            .unwrap_or(DEFAULT_SYNC_HOURS))
    }

    pub fn page_size(&self) -> Result<u32> {
        match self.store.get_parsed::<u32>(PAGE_SIZE_KEY)? {
            Some(size) => {
                check_page_size(size)?;
                Ok(size)
            }
            None => Ok(DEFAULT_PAGE_SIZE),
        }
    }

    pub fn http_timeout(&self) -> Result<Duration> {
        Ok(self.auth_config()?.http_timeout)
    }

    /// Opens the contact cache, creating the config directory first.
    pub fn open_cache(&self) -> Result<ContactCache> {
        self.dir.ensure_exists()?;
        ContactCache::open(self.dir.contacts_db_path())
    }
}

fn check_page_size(size: u32) -> Result<()> {
    if size == 0 || size > MAX_PAGE_SIZE {
        return Err(Error::validation(format!(
            "{} must be between 1 and {}",
            PAGE_SIZE_KEY, MAX_PAGE_SIZE
        )));
    }
    Ok(())
}

/// Rejects values a known key cannot hold. Unknown keys pass.
pub fn validate_setting(key: &str, value: &str) -> Result<()> {
    let number = |key: &str| {
        value.trim().parse::<u64>().map_err(|_| {
            Error::validation(format!("{} must be a whole number, got '{}'", key, value))
        })
    };

    match key {
        SCOPES_KEY if parse_scopes(value).is_empty() => {
            Err(Error::validation("scopes must name at least one scope"))
        }
        SYNC_HOURS_KEY | CALLBACK_TIMEOUT_KEY => number(key).map(|_| ()),
        PAGE_SIZE_KEY => {
            let size = number(key)?;
            check_page_size(u32::try_from(size).unwrap_or(u32::MAX))
        }
        _ => Ok(()),
    }
}

pub fn is_known_key(key: &str) -> bool {
    KNOWN_KEYS.iter().any(|(known, _)| *known == key)
}
