//! Command handlers.
//!
//! Each handler writes its human-readable (or `--json`) result to `out`;
//! diagnostics go through `tracing` to stderr.

pub mod auth;
pub mod config;
pub mod contacts;

use std::io::Write;

use serde::Serialize;

use crate::error::{ClientError, ClientResult};

/// Writes `value` as pretty JSON followed by a newline.
pub(crate) fn write_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> ClientResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| {
        ClientError::Core(gwcli_core::Error::validation("failed to encode output").with_source(e))
    })?;
    writeln!(out, "{}", json)?;
    Ok(())
}
