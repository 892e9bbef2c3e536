//! Contact cache commands.

use std::io::Write;

use serde::Serialize;
use tracing::info;

use gwcli_auth::{ApiClient, Authenticator};
use gwcli_people::{CachedContact, ContactCache, ContactSource, PeopleClient, SyncEngine, SyncOptions};

use crate::commands::write_json;
use crate::error::{ClientError, ClientResult};
use crate::settings::Settings;

/// Totals over every page of one `contacts sync` run.
#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub synced: usize,
    pub removed: usize,
    pub pages: usize,
    pub full_sync: bool,
    pub skipped: bool,
}

/// Drives the sync engine page by page until the listing is exhausted.
pub fn sync_all<S: ContactSource>(
    cache: &ContactCache,
    source: &S,
    full: bool,
    page_size: u32,
) -> ClientResult<SyncSummary> {
    let engine = SyncEngine::new(cache, source);
    let mut options = SyncOptions {
        full,
        page_token: None,
        page_size,
    };
    let mut summary = SyncSummary::default();

    loop {
        let outcome = engine.sync(&options)?;
        summary.synced += outcome.synced;
        summary.removed += outcome.removed;
        summary.pages += 1;
        summary.full_sync |= outcome.full_sync;
        if !outcome.has_more() {
            break;
        }
        options = options.next_page(&outcome);
    }
    Ok(summary)
}

pub fn sync(
    settings: &Settings,
    full: bool,
    if_older_than: Option<Option<u64>>,
    json: bool,
    out: &mut dyn Write,
) -> ClientResult<()> {
    let cache = settings.open_cache()?;

    if let Some(hours) = if_older_than {
        let hours = match hours {
            Some(hours) => hours,
            None => settings.sync_hours()?,
        };
        if !cache.should_sync(hours)? {
            info!("last sync is newer than {}h, skipping", hours);
            let summary = SyncSummary {
                skipped: true,
                ..Default::default()
            };
            return report_sync(&cache, &summary, json, out);
        }
    }

    let auth = Authenticator::new(settings.credential_store(), settings.auth_config()?)?;
    let credentials = auth.get_credentials(&auth.config().scopes)?;
    let api = ApiClient::new(credentials, settings.http_timeout()?)?;
    let source = PeopleClient::new(api);

    let summary = sync_all(&cache, &source, full, settings.page_size()?)?;
    report_sync(&cache, &summary, json, out)
}

fn report_sync(
    cache: &ContactCache,
    summary: &SyncSummary,
    json: bool,
    out: &mut dyn Write,
) -> ClientResult<()> {
    if json {
        return write_json(out, summary);
    }
    if summary.skipped {
        let last = cache
            .last_sync_time()?
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "never".to_string());
        writeln!(out, "Contacts are up to date (last sync {}).", last)?;
        return Ok(());
    }
    writeln!(
        out,
        "Synced {} contact(s), removed {} ({} sync, {} page(s)); {} cached.",
        summary.synced,
        summary.removed,
        if summary.full_sync { "full" } else { "incremental" },
        summary.pages,
        cache.count()?
    )?;
    Ok(())
}

/// One line per contact: name, email, phone, organization, resource name.
pub fn contact_line(contact: &CachedContact) -> String {
    let name = if contact.display_name.is_empty() {
        "(no name)"
    } else {
        contact.display_name.as_str()
    };
    let mut line = name.to_string();
    if !contact.email.is_empty() {
        line.push_str(&format!(" <{}>", contact.email));
    }
    for extra in [&contact.phone, &contact.organization] {
        if !extra.is_empty() {
            line.push_str("  ");
            line.push_str(extra);
        }
    }
    line.push_str(&format!("  [{}]", contact.resource_name));
    line
}

fn print_contacts(contacts: &[CachedContact], json: bool, out: &mut dyn Write) -> ClientResult<()> {
    if json {
        return write_json(out, contacts);
    }
    for contact in contacts {
        writeln!(out, "{}", contact_line(contact))?;
    }
    Ok(())
}

pub fn search(
    settings: &Settings,
    query: &str,
    limit: usize,
    json: bool,
    out: &mut dyn Write,
) -> ClientResult<()> {
    let contacts = settings.open_cache()?.search_cache(query, limit)?;
    if contacts.is_empty() && !json {
        writeln!(out, "No cached contacts match '{}'.", query)?;
        return Ok(());
    }
    print_contacts(&contacts, json, out)
}

pub fn list(
    settings: &Settings,
    limit: usize,
    sort_by: &str,
    json: bool,
    out: &mut dyn Write,
) -> ClientResult<()> {
    let contacts = settings.open_cache()?.list_cached(limit, sort_by)?;
    if contacts.is_empty() && !json {
        writeln!(out, "No cached contacts; run `gwcli contacts sync`.")?;
        return Ok(());
    }
    print_contacts(&contacts, json, out)
}

pub fn get(
    settings: &Settings,
    resource_name: &str,
    json: bool,
    out: &mut dyn Write,
) -> ClientResult<()> {
    let contact = settings
        .open_cache()?
        .get_from_cache(resource_name)?
        .ok_or_else(|| {
            ClientError::usage(format!(
                "{} is not in the contact cache; run `gwcli contacts sync`",
                resource_name
            ))
        })?;

    if json {
        return write_json(out, &contact.full_record);
    }
    writeln!(out, "{}", contact_line(&contact))?;
    if let Some(modified) = &contact.last_modified {
        writeln!(out, "Updated: {}", modified)?;
    }
    writeln!(out, "Cached:  {}", contact.cached_at.to_rfc3339())?;
    write_json(out, &contact.full_record)
}

pub fn clear(settings: &Settings, out: &mut dyn Write) -> ClientResult<()> {
    let cache = settings.open_cache()?;
    let count = cache.count()?;
    cache.clear_cache()?;
    writeln!(out, "Removed {} cached contact(s).", count)?;
    Ok(())
}
