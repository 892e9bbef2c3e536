//! CLI definition and command handlers
//!
//! This crate provides the `gwcli` command-line interface.

pub mod cli;
pub mod commands;
pub mod error;
pub mod settings;

pub use cli::Cli;
pub use error::{ClientError, ClientResult};
pub use settings::Settings;
