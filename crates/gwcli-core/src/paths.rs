//! Per-user configuration directory and the files gwcli keeps in it.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

/// Environment variable that overrides the configuration directory.
pub const CONFIG_DIR_ENV: &str = "GWCLI_CONFIG_DIR";

/// File holding the OAuth client id/secret downloaded from the Cloud Console.
pub const CLIENT_SECRET_FILE: &str = "client_secret.json";
/// File holding the current OAuth token set.
pub const TOKEN_FILE: &str = "token.json";
/// Generic key/value settings.
pub const CONFIG_FILE: &str = "config.toml";
/// SQLite database backing the contact cache.
pub const CONTACTS_DB_FILE: &str = "contacts.db";

/// The directory that owns every persisted gwcli file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDir {
    root: PathBuf,
}

impl ConfigDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves the directory from `$GWCLI_CONFIG_DIR`, falling back to
    /// `<platform config dir>/gwcli`.
    pub fn from_env() -> Self {
        match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) if !dir.is_empty() => Self::new(dir),
            _ => Self::new(Self::default_root()),
        }
    }

    /// `~/.config/gwcli` on Linux, the platform equivalent elsewhere.
    pub fn default_root() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gwcli")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn client_secret_path(&self) -> PathBuf {
        self.root.join(CLIENT_SECRET_FILE)
    }

    pub fn token_path(&self) -> PathBuf {
        self.root.join(TOKEN_FILE)
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn contacts_db_path(&self) -> PathBuf {
        self.root.join(CONTACTS_DB_FILE)
    }

    /// Creates the directory if needed, owner-only on Unix.
    pub fn ensure_exists(&self) -> Result<()> {
        if self.root.is_dir() {
            return Ok(());
        }
        fs::create_dir_all(&self.root).map_err(|e| {
            Error::config(format!(
                "failed to create config directory {}",
                self.root.display()
            ))
            .with_source(e)
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.root, fs::Permissions::from_mode(0o700)).map_err(|e| {
                Error::config(format!(
                    "failed to restrict permissions on {}",
                    self.root.display()
                ))
                .with_source(e)
            })?;
        }

        debug!("created config directory {:?}", self.root);
        Ok(())
    }
}

/// How strictly a file written by [`write_atomic`] is protected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    /// Owner read/write only (0600). Used for secrets and tokens.
    Private,
    /// Whatever the process umask allows.
    Default,
}

/// Writes `contents` to `path` through a sibling temp file and a rename, so a
/// failed write never truncates the previous version.
///
/// With [`FileMode::Private`] the temp file is created 0600 and the final
/// file is chmod'ed to 0600 again after the rename, every time.
pub fn write_atomic(path: &Path, contents: &[u8], mode: FileMode) -> Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| Error::config(format!("invalid file path {}", path.display())))?;
    let mut temp_name = file_name.to_os_string();
    temp_name.push(format!(".{}.tmp", std::process::id()));
    let temp_path = path.with_file_name(temp_name);

    let write_err = |e: std::io::Error| {
        Error::config(format!("failed to write {}", path.display())).with_source(e)
    };

    let written = write_temp(&temp_path, contents, mode).and_then(|()| fs::rename(&temp_path, path));
    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(write_err(e));
    }

    if mode == FileMode::Private {
        restrict_to_owner(path)?;
    }

    debug!("wrote {} bytes to {:?}", contents.len(), path);
    Ok(())
}

fn write_temp(temp_path: &Path, contents: &[u8], mode: FileMode) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    if mode == FileMode::Private {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    #[cfg(not(unix))]
    let _ = mode;
    let mut file = options.open(temp_path)?;
    file.write_all(contents)?;
    file.sync_all()
}

/// Sets owner-only read/write permissions on `path`.
pub fn restrict_to_owner(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|e| {
            Error::config(format!(
                "failed to restrict permissions on {}",
                path.display()
            ))
            .with_source(e)
        })?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}
