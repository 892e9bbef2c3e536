//! Generic key/value settings backed by `config.toml`.
//!
//! A missing or blank file reads as empty. A file that exists but does not
//! parse is reported as a [`ErrorKind::Config`](crate::ErrorKind::Config)
//! error instead of being treated as empty, so a typo never silently drops
//! every setting. Writes go through `toml_edit` so comments and tables the
//! user added by hand survive `set` and `delete`.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use toml_edit::DocumentMut;
use tracing::debug;

use crate::error::{Error, Result};
use crate::paths::{FileMode, write_atomic};

/// Key/value settings file.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the value stored under `key`, rendered as a string.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let doc = self.load_document()?;
        Ok(doc
            .as_table()
            .get(key)
            .and_then(|item| item.as_value())
            .map(render_value))
    }

    /// Returns the value under `key` parsed as `T`.
    ///
    /// A value that is present but does not parse is a validation error.
    pub fn get_parsed<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.get(key)? {
            None => Ok(None),
            Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| {
                Error::validation(format!("invalid value for '{}': {} ({})", key, raw, e))
            }),
        }
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        let mut doc = self.load_document()?;
        doc[key] = toml_edit::value(value);
        self.save_document(&doc)?;
        debug!("set config key {}", key);
        Ok(())
    }

    /// Removes `key`. Returns false if it was not present.
    pub fn delete(&self, key: &str) -> Result<bool> {
        let mut doc = self.load_document()?;
        let removed = doc.as_table_mut().remove(key).is_some();
        if removed {
            self.save_document(&doc)?;
            debug!("deleted config key {}", key);
        }
        Ok(removed)
    }

    /// Lists every top-level key with its value. Nested tables are skipped.
    pub fn list(&self) -> Result<BTreeMap<String, String>> {
        let doc = self.load_document()?;
        Ok(doc
            .as_table()
            .iter()
            .filter_map(|(key, item)| item.as_value().map(|v| (key.to_string(), render_value(v))))
            .collect())
    }

    fn load_document(&self) -> Result<DocumentMut> {
        if !self.path.exists() {
            debug!("no config file at {:?}", self.path);
            return Ok(DocumentMut::new());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            Error::config(format!("failed to read {}", self.path.display())).with_source(e)
        })?;

        if content.trim().is_empty() {
            return Ok(DocumentMut::new());
        }

        content.parse::<DocumentMut>().map_err(|e| {
            Error::config(format!(
                "failed to parse {}; fix or remove the file",
                self.path.display()
            ))
            .with_source(e)
        })
    }

    fn save_document(&self, doc: &DocumentMut) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::config(format!("failed to create {}", parent.display())).with_source(e)
            })?;
        }
        write_atomic(&self.path, doc.to_string().as_bytes(), FileMode::Default)
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(Error::validation("config key must not be empty"));
    }
    if key.chars().any(char::is_whitespace) {
        return Err(Error::validation(format!(
            "config key '{}' must not contain whitespace",
            key
        )));
    }
    Ok(())
}

fn render_value(value: &toml_edit::Value) -> String {
    match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string().trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn store() -> (tempfile::TempDir, ConfigStore) {
        let tmp = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(tmp.path().join("config.toml"));
        (tmp, store)
    }

    #[test]
    fn missing_file_is_empty() {
        let (_tmp, store) = store();
        assert_eq!(store.get("scopes").unwrap(), None);
        assert!(store.list().unwrap().is_empty());
        assert!(!store.delete("scopes").unwrap());
    }

    #[test]
    fn set_get_delete() {
        let (_tmp, store) = store();
        store.set("sync_hours", "12").unwrap();
        store.set("scopes", "contacts.readonly").unwrap();

        assert_eq!(store.get("sync_hours").unwrap(), Some("12".to_string()));
        assert_eq!(store.get_parsed::<u32>("sync_hours").unwrap(), Some(12));

        let all = store.list().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all["scopes"], "contacts.readonly");

        assert!(store.delete("sync_hours").unwrap());
        assert_eq!(store.get("sync_hours").unwrap(), None);
    }

    #[test]
    fn malformed_file_is_an_error_not_empty() {
        let (_tmp, store) = store();
        fs::write(store.path(), "this is = = not toml").unwrap();

        let err = store.get("anything").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        let err = store.set("key", "value").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn blank_file_is_empty() {
        let (_tmp, store) = store();
        fs::write(store.path(), "\n   \n").unwrap();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn non_string_values_are_rendered() {
        let (_tmp, store) = store();
        fs::write(store.path(), "page_size = 200\nverbose = true\n").unwrap();
        assert_eq!(store.get("page_size").unwrap(), Some("200".to_string()));
        assert_eq!(store.get_parsed::<bool>("verbose").unwrap(), Some(true));
    }

    #[test]
    fn unparsable_typed_value_is_validation_error() {
        let (_tmp, store) = store();
        store.set("sync_hours", "soon").unwrap();
        let err = store.get_parsed::<u32>("sync_hours").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn comments_and_tables_survive_set() {
        let (_tmp, store) = store();
        fs::write(
            store.path(),
            "# my settings\nsync_hours = \"6\"\n\n[extra]\nkeep = 1\n",
        )
        .unwrap();

        store.set("page_size", "50").unwrap();
        let content = fs::read_to_string(store.path()).unwrap();
        assert!(content.contains("# my settings"));
        assert!(content.contains("[extra]"));

        let all = store.list().unwrap();
        assert_eq!(all.len(), 2);
        assert!(!all.contains_key("extra"));
    }

    #[test]
    fn invalid_keys_are_rejected() {
        let (_tmp, store) = store();
        assert_eq!(
            store.set("", "x").unwrap_err().kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            store.set("two words", "x").unwrap_err().kind(),
            ErrorKind::Validation
        );
    }
}
