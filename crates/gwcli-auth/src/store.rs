//! File-backed persistence for the client secret and the token set.

use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::Path;

use gwcli_core::{ConfigDir, Error, FileMode, Result, write_atomic};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::secret::ClientSecret;
use crate::token::TokenRecord;

/// Reads and writes the auth files inside a [`ConfigDir`].
#[derive(Debug, Clone)]
pub struct CredentialStore {
    dir: ConfigDir,
}

impl CredentialStore {
    pub fn new(dir: ConfigDir) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &ConfigDir {
        &self.dir
    }

    pub fn has_client_secret(&self) -> bool {
        self.dir.client_secret_path().is_file()
    }

    pub fn has_token(&self) -> bool {
        self.dir.token_path().is_file()
    }

    pub fn load_client_secret(&self) -> Result<ClientSecret> {
        let path = self.dir.client_secret_path();
        let content = read_existing(&path, "no client secret found; run `gwcli auth setup`")?;
        ClientSecret::from_json(&content)
    }

    /// Stores `secret` in the canonical `installed` layout.
    pub fn save_client_secret(&self, secret: &ClientSecret) -> Result<()> {
        secret.validate()?;
        let wrapped = InstalledSecret { installed: secret };
        self.write_json(&self.dir.client_secret_path(), &wrapped)?;
        info!("saved client secret for {}", secret.client_id);
        Ok(())
    }

    pub fn load_token(&self) -> Result<TokenRecord> {
        let path = self.dir.token_path();
        let content = read_existing(&path, "not authenticated; run `gwcli auth login`")?;
        decode(&path, &content)
    }

    pub fn save_token(&self, record: &TokenRecord) -> Result<()> {
        self.write_json(&self.dir.token_path(), record)?;
        debug!("saved token, expiry {:?}", record.expiry);
        Ok(())
    }

    /// Removes the token file. Returns false if there was none.
    pub fn delete_token(&self) -> Result<bool> {
        let path = self.dir.token_path();
        match fs::remove_file(&path) {
            Ok(()) => {
                info!("deleted token {:?}", path);
                Ok(true)
            }
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(false),
            Err(e) => Err(
                Error::config(format!("failed to delete {}", path.display())).with_source(e),
            ),
        }
    }

    fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<()> {
        self.dir.ensure_exists()?;
        let content = serde_json::to_vec_pretty(value).map_err(|e| {
            Error::config(format!("failed to encode {}", path.display())).with_source(e)
        })?;
        write_atomic(path, &content, FileMode::Private)
    }
}

#[derive(Serialize)]
struct InstalledSecret<'a> {
    installed: &'a ClientSecret,
}

/// Reads `path`, turning a missing file into an authentication error that
/// tells the user what to run.
fn read_existing(path: &Path, missing_hint: &str) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == IoErrorKind::NotFound => {
            debug!("{:?} does not exist", path);
            Err(Error::authentication(missing_hint))
        }
        Err(e) => Err(Error::config(format!("failed to read {}", path.display())).with_source(e)),
    }
}

fn decode<T: DeserializeOwned>(path: &Path, content: &str) -> Result<T> {
    serde_json::from_str(content).map_err(|e| {
        Error::config(format!("failed to decode {}", path.display())).with_source(e)
    })
}
