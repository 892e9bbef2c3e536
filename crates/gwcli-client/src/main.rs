//! gwcli CLI entry point.

use std::io::Write;
use std::process::ExitCode;

use clap::Parser;

use gwcli_client::cli::{AuthAction, Cli, Command, ConfigAction, ContactsAction};
use gwcli_client::commands::{auth, config, contacts};
use gwcli_client::{ClientResult, Settings};
use gwcli_core::{TracingConfig, init_tracing};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing_config = if cli.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::cli()
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: {}", e);
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> ClientResult<()> {
    let settings = Settings::new(cli.config_dir);
    let json = cli.json;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let result = match cli.command {
        Command::Auth { action } => match action {
            AuthAction::Setup { credentials_file } => {
                auth::setup(&settings, &credentials_file, &mut out)
            }
            AuthAction::Login {
                scopes,
                manual,
                force,
            } => auth::login(&settings, scopes, manual, force, &mut out),
            AuthAction::Refresh => auth::refresh(&settings, &mut out),
            AuthAction::Status => auth::status(&settings, json, &mut out),
            AuthAction::Logout => auth::logout(&settings, &mut out),
        },
        Command::Contacts { action } => match action {
            ContactsAction::Sync {
                full,
                if_older_than,
            } => contacts::sync(&settings, full, if_older_than, json, &mut out),
            ContactsAction::Search { query, limit } => {
                contacts::search(&settings, &query, limit, json, &mut out)
            }
            ContactsAction::List { limit, sort_by } => {
                contacts::list(&settings, limit, &sort_by, json, &mut out)
            }
            ContactsAction::Get { resource_name } => {
                contacts::get(&settings, &resource_name, json, &mut out)
            }
            ContactsAction::Clear => contacts::clear(&settings, &mut out),
        },
        Command::Config { action } => match action {
            ConfigAction::Get { key } => config::get(&settings, &key, &mut out),
            ConfigAction::Set { key, value } => config::set(&settings, &key, &value, &mut out),
            ConfigAction::Delete { key } => config::delete(&settings, &key, &mut out),
            ConfigAction::List => config::list(&settings, json, &mut out),
            ConfigAction::Path => config::path(&settings, &mut out),
        },
    };

    result?;
    out.flush()?;
    Ok(())
}
