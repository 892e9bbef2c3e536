//! SQLite mirror of the user's contacts plus the sync bookkeeping row.
//!
//! Contacts are keyed by `resourceName` and keep the remote record verbatim
//! next to a few denormalized columns used for search and listing. The
//! single `sync_state` row holds the incremental cursor, the time of the
//! last completed sync, and the start time of an in-progress full pass.

use std::path::Path;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use gwcli_core::{Error, Result};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde_json::Value;
use tracing::{debug, info};

use crate::contact::{CachedContact, ContactFields};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS contacts (
    resource_name TEXT PRIMARY KEY,
    display_name  TEXT NOT NULL DEFAULT '',
    email         TEXT NOT NULL DEFAULT '',
    phone         TEXT NOT NULL DEFAULT '',
    organization  TEXT NOT NULL DEFAULT '',
    full_record   TEXT NOT NULL,
    last_modified TEXT,
    cached_at     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_contacts_display_name ON contacts(display_name);
CREATE INDEX IF NOT EXISTS idx_contacts_email ON contacts(email);

CREATE TABLE IF NOT EXISTS sync_state (
    id                   INTEGER PRIMARY KEY CHECK (id = 1),
    last_sync_token      TEXT,
    last_sync_time       TEXT,
    full_sync_started_at TEXT
);

INSERT OR IGNORE INTO sync_state (id) VALUES (1);
";

/// Upper bound for sync thresholds (about a century).
const MAX_SYNC_HOURS: i64 = 24 * 365 * 100;

const SELECT_CONTACT: &str = "SELECT resource_name, display_name, email, phone, organization,
            full_record, last_modified, cached_at
     FROM contacts";

/// Ordering accepted by [`ContactCache::list_cached`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Name,
    Email,
    /// Most recently modified first.
    Updated,
}

impl SortKey {
    /// Parses a user-supplied key. Anything unknown sorts by name.
    pub fn parse(key: &str) -> Self {
        match key.trim().to_ascii_lowercase().as_str() {
            "email" => Self::Email,
            "updated" => Self::Updated,
            _ => Self::Name,
        }
    }

    fn order_by(self) -> &'static str {
        match self {
            Self::Name => "display_name COLLATE NOCASE, resource_name",
            Self::Email => "email COLLATE NOCASE, resource_name",
            Self::Updated => "last_modified IS NULL, last_modified DESC, resource_name",
        }
    }
}

/// Maps a storage failure to an API error naming the operation.
fn storage_error(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> Error {
    move |e| Error::api(format!("cache {} failed", operation)).with_source(e)
}

fn format_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::api(format!("corrupt timestamp '{}' in cache", raw)).with_source(e))
}

/// Escapes `%`, `_` and the escape character itself for `LIKE ... ESCAPE '\'`.
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 1);
    for c in query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

struct ContactRow {
    resource_name: String,
    display_name: String,
    email: String,
    phone: String,
    organization: String,
    full_record: String,
    last_modified: Option<String>,
    cached_at: String,
}

impl ContactRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            resource_name: row.get(0)?,
            display_name: row.get(1)?,
            email: row.get(2)?,
            phone: row.get(3)?,
            organization: row.get(4)?,
            full_record: row.get(5)?,
            last_modified: row.get(6)?,
            cached_at: row.get(7)?,
        })
    }

    fn into_contact(self) -> Result<CachedContact> {
        let full_record: Value = serde_json::from_str(&self.full_record).map_err(|e| {
            Error::api(format!("corrupt cached record for {}", self.resource_name)).with_source(e)
        })?;
        Ok(CachedContact {
            cached_at: parse_time(&self.cached_at)?,
            resource_name: self.resource_name,
            display_name: self.display_name,
            email: self.email,
            phone: self.phone,
            organization: self.organization,
            full_record,
            last_modified: self.last_modified,
        })
    }
}

/// Local contact store.
pub struct ContactCache {
    conn: Connection,
}

impl ContactCache {
    /// Opens (creating if needed) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| {
            Error::api(format!("failed to open contact cache {}", path.display())).with_source(e)
        })?;
        debug!("opened contact cache {:?}", path);
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(storage_error("open"))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(storage_error("schema setup"))?;
        Ok(Self { conn })
    }

    /// Inserts or fully replaces the row for the record's `resourceName`.
    pub fn cache_contact(&self, record: &Value) -> Result<()> {
        self.cache_contact_at(record, Utc::now())
    }

    pub(crate) fn cache_contact_at(&self, record: &Value, cached_at: DateTime<Utc>) -> Result<()> {
        let fields = ContactFields::from_record(record)?;
        let full_record = serde_json::to_string(record)
            .map_err(|e| Error::api("cache write failed").with_source(e))?;

        self.conn
            .execute(
                "INSERT OR REPLACE INTO contacts
                    (resource_name, display_name, email, phone, organization,
                     full_record, last_modified, cached_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    fields.resource_name,
                    fields.display_name,
                    fields.email,
                    fields.phone,
                    fields.organization,
                    full_record,
                    fields.last_modified,
                    format_time(cached_at),
                ],
            )
            .map_err(storage_error("write"))?;
        Ok(())
    }

    pub fn get_from_cache(&self, resource_name: &str) -> Result<Option<CachedContact>> {
        let row = self
            .conn
            .query_row(
                &format!("{} WHERE resource_name = ?1", SELECT_CONTACT),
                params![resource_name],
                ContactRow::from_row,
            )
            .optional()
            .map_err(storage_error("read"))?;
        row.map(ContactRow::into_contact).transpose()
    }

    /// Prefix search on display name and email, ordered by name.
    ///
    /// Matching follows SQLite `LIKE`, so it ignores ASCII case only.
    pub fn search_cache(&self, query: &str, limit: usize) -> Result<Vec<CachedContact>> {
        if query.trim().is_empty() {
            return Err(Error::validation("search query must not be empty"));
        }
        if limit == 0 {
            return Err(Error::validation("search limit must be at least 1"));
        }

        let pattern = format!("{}%", escape_like(query));
        self.query_contacts(
            &format!(
                "{} WHERE display_name LIKE ?1 ESCAPE '\\' OR email LIKE ?1 ESCAPE '\\'
                 ORDER BY display_name COLLATE NOCASE, resource_name LIMIT ?2",
                SELECT_CONTACT
            ),
            params![pattern, limit as i64],
        )
    }

    /// Lists up to `limit` contacts. An unknown `sort_by` sorts by name.
    pub fn list_cached(&self, limit: usize, sort_by: &str) -> Result<Vec<CachedContact>> {
        if limit == 0 {
            return Err(Error::validation("list limit must be at least 1"));
        }
        let sort = SortKey::parse(sort_by);
        self.query_contacts(
            &format!("{} ORDER BY {} LIMIT ?1", SELECT_CONTACT, sort.order_by()),
            params![limit as i64],
        )
    }

    fn query_contacts(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<CachedContact>> {
        let mut stmt = self.conn.prepare(sql).map_err(storage_error("read"))?;
        let rows = stmt
            .query_map(params, ContactRow::from_row)
            .map_err(storage_error("read"))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(storage_error("read"))?;
        rows.into_iter().map(ContactRow::into_contact).collect()
    }

    /// Deletes one contact. Returns false if it was not cached.
    pub fn remove_contact(&self, resource_name: &str) -> Result<bool> {
        let removed = self
            .conn
            .execute(
                "DELETE FROM contacts WHERE resource_name = ?1",
                params![resource_name],
            )
            .map_err(storage_error("delete"))?;
        Ok(removed > 0)
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM contacts", [], |row| row.get(0))
            .map_err(storage_error("read"))?;
        Ok(count as usize)
    }

    pub fn get_sync_token(&self) -> Result<Option<String>> {
        self.conn
            .query_row("SELECT last_sync_token FROM sync_state WHERE id = 1", [], |row| {
                row.get(0)
            })
            .map_err(storage_error("read"))
    }

    /// Stores the cursor and stamps the sync time.
    pub fn set_sync_token(&self, token: &str) -> Result<()> {
        self.record_sync(Some(token))
    }

    /// Stamps the sync time, replacing the cursor only when one is given.
    pub fn record_sync(&self, token: Option<&str>) -> Result<()> {
        self.record_sync_at(token, Utc::now())
    }

    pub(crate) fn record_sync_at(&self, token: Option<&str>, at: DateTime<Utc>) -> Result<()> {
        self.conn
            .execute(
                "UPDATE sync_state
                 SET last_sync_token = COALESCE(?1, last_sync_token), last_sync_time = ?2
                 WHERE id = 1",
                params![token, format_time(at)],
            )
            .map_err(storage_error("write"))?;
        debug!("recorded sync (new cursor: {})", token.is_some());
        Ok(())
    }

    pub fn last_sync_time(&self) -> Result<Option<DateTime<Utc>>> {
        let raw: Option<String> = self
            .conn
            .query_row("SELECT last_sync_time FROM sync_state WHERE id = 1", [], |row| {
                row.get(0)
            })
            .map_err(storage_error("read"))?;
        raw.as_deref().map(parse_time).transpose()
    }

    /// True if the cache was never synced or the last sync is older than `hours`.
    pub fn should_sync(&self, hours: u64) -> Result<bool> {
        self.should_sync_at(hours, Utc::now())
    }

    pub fn should_sync_at(&self, hours: u64, now: DateTime<Utc>) -> Result<bool> {
        let hours = i64::try_from(hours).unwrap_or(i64::MAX).min(MAX_SYNC_HOURS);
        let threshold = Duration::hours(hours);
        Ok(match self.last_sync_time()? {
            None => true,
            Some(last) => now - last > threshold,
        })
    }

    /// Marks the start of a full pass. Rows not rewritten before
    /// [`finish_full_sync`](Self::finish_full_sync) will be pruned.
    pub fn begin_full_sync(&self, started_at: DateTime<Utc>) -> Result<()> {
        self.conn
            .execute(
                "UPDATE sync_state SET full_sync_started_at = ?1 WHERE id = 1",
                params![format_time(started_at)],
            )
            .map_err(storage_error("write"))?;
        debug!("full sync started at {}", started_at);
        Ok(())
    }

    pub fn full_sync_started_at(&self) -> Result<Option<DateTime<Utc>>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT full_sync_started_at FROM sync_state WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .map_err(storage_error("read"))?;
        raw.as_deref().map(parse_time).transpose()
    }

    /// Ends a full pass: deletes rows cached before it started and clears
    /// the marker. Returns the number of pruned rows; 0 when no pass was open.
    pub fn finish_full_sync(&self) -> Result<usize> {
        let Some(started_at) = self.full_sync_started_at()? else {
            return Ok(0);
        };
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(storage_error("prune"))?;
        let pruned = tx
            .execute(
                "DELETE FROM contacts WHERE cached_at < ?1",
                params![format_time(started_at)],
            )
            .map_err(storage_error("prune"))?;
        tx.execute(
            "UPDATE sync_state SET full_sync_started_at = NULL WHERE id = 1",
            [],
        )
        .map_err(storage_error("prune"))?;
        tx.commit().map_err(storage_error("prune"))?;

        if pruned > 0 {
            info!("pruned {} contacts missing from the full sync", pruned);
        }
        Ok(pruned)
    }

    /// Deletes every contact and resets the sync state.
    pub fn clear_cache(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "BEGIN;
                 DELETE FROM contacts;
                 UPDATE sync_state
                 SET last_sync_token = NULL, last_sync_time = NULL, full_sync_started_at = NULL
                 WHERE id = 1;
                 COMMIT;",
            )
            .map_err(storage_error("clear"))?;
        info!("contact cache cleared");
        Ok(())
    }
}
