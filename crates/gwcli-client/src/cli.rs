//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// gwcli - Google Workspace from the terminal
#[derive(Debug, Parser)]
#[command(name = "gwcli")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding credentials, tokens, settings and the contact cache
    #[arg(long, global = true, env = "GWCLI_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Authentication commands
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },

    /// Contact cache commands
    Contacts {
        #[command(subcommand)]
        action: ContactsAction,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Authentication actions.
#[derive(Debug, Subcommand)]
pub enum AuthAction {
    /// Install the OAuth client credentials
    ///
    /// The file is the JSON downloaded from the Google Cloud Console
    /// OAuth 2.0 credentials page ("Desktop app" client).
    Setup {
        /// Path to Google Cloud Console credentials JSON file
        #[arg(long)]
        credentials_file: PathBuf,
    },

    /// Authorize gwcli in the browser and store the token
    Login {
        /// OAuth scope to request (can be repeated; defaults to the configured scopes)
        #[arg(long = "scope", action = clap::ArgAction::Append)]
        scopes: Vec<String>,

        /// Paste the authorization code instead of listening for the redirect
        #[arg(long)]
        manual: bool,

        /// Re-authenticate even if a usable token is stored
        #[arg(long, short)]
        force: bool,
    },

    /// Refresh the stored access token now
    Refresh,

    /// Show what is stored and whether it is usable
    Status,

    /// Delete the stored token
    Logout,
}

/// Contact cache actions.
#[derive(Debug, Subcommand)]
pub enum ContactsAction {
    /// Fetch contacts into the local cache
    Sync {
        /// Ignore the stored sync token and fetch everything
        #[arg(long)]
        full: bool,

        /// Skip the sync unless the last one is older than HOURS
        /// (the `sync_hours` setting when no value is given)
        #[arg(long, value_name = "HOURS")]
        if_older_than: Option<Option<u64>>,
    },

    /// Find cached contacts whose name or email starts with QUERY
    Search {
        query: String,

        /// Maximum number of results
        #[arg(long, short = 'n', default_value_t = 20)]
        limit: usize,
    },

    /// List cached contacts
    List {
        /// Maximum number of results
        #[arg(long, short = 'n', default_value_t = 100)]
        limit: usize,

        /// Sort order: name, email or updated
        #[arg(long, default_value = "name")]
        sort_by: String,
    },

    /// Show one cached contact with its full record
    Get {
        /// Resource name, e.g. people/c123
        resource_name: String,
    },

    /// Delete every cached contact and forget the sync token
    Clear,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print one setting
    Get { key: String },

    /// Store a setting
    Set { key: String, value: String },

    /// Remove a setting
    Delete { key: String },

    /// Print every stored setting
    List,

    /// Show configuration file path
    Path,
}
