//! Configuration commands.

use std::io::Write;

use tracing::info;

use crate::commands::write_json;
use crate::error::{ClientError, ClientResult};
use crate::settings::{KNOWN_KEYS, Settings, is_known_key, validate_setting};

pub fn get(settings: &Settings, key: &str, out: &mut dyn Write) -> ClientResult<()> {
    match settings.store().get(key)? {
        Some(value) => writeln!(out, "{}", value)?,
        None => return Err(ClientError::usage(format!("{} is not set", key))),
    }
    Ok(())
}

/// Stores a setting after checking values of the known keys.
pub fn set(settings: &Settings, key: &str, value: &str, out: &mut dyn Write) -> ClientResult<()> {
    validate_setting(key, value)?;
    settings.dir().ensure_exists()?;
    settings.store().set(key, value)?;
    info!("set {} in {}", key, settings.store().path().display());
    if !is_known_key(key) {
        writeln!(out, "warning: {} is not a setting gwcli reads", key)?;
    }
    Ok(())
}

pub fn delete(settings: &Settings, key: &str, out: &mut dyn Write) -> ClientResult<()> {
    if !settings.store().delete(key)? {
        writeln!(out, "{} was not set", key)?;
    }
    Ok(())
}

/// Prints every stored setting, then the known keys that are still unset.
pub fn list(settings: &Settings, json: bool, out: &mut dyn Write) -> ClientResult<()> {
    let values = settings.store().list()?;
    if json {
        return write_json(out, &values);
    }

    for (key, value) in &values {
        writeln!(out, "{} = {}", key, value)?;
    }
    let unset: Vec<_> = KNOWN_KEYS
        .iter()
        .filter(|(key, _)| !values.contains_key(*key))
        .collect();
    if !unset.is_empty() {
        if !values.is_empty() {
            writeln!(out)?;
        }
        writeln!(out, "# unset (defaults apply):")?;
        for (key, description) in unset {
            writeln!(out, "#   {}: {}", key, description)?;
        }
    }
    Ok(())
}

/// Show the configuration directory and the files inside it.
pub fn path(settings: &Settings, out: &mut dyn Write) -> ClientResult<()> {
    let dir = settings.dir();
    writeln!(out, "config dir:    {}", dir.root().display())?;
    writeln!(out, "config:        {}", dir.config_path().display())?;
    writeln!(out, "client secret: {}", dir.client_secret_path().display())?;
    writeln!(out, "token:         {}", dir.token_path().display())?;
    writeln!(out, "contacts:      {}", dir.contacts_db_path().display())?;
    Ok(())
}
