//! Reconciles the contact cache with a [`ContactSource`].
//!
//! Each call handles one page. Without a stored cursor (or when forced) the
//! listing is FULL and asks for a new cursor; otherwise it is INCREMENTAL
//! from the stored cursor. An expired cursor is retried once as a FULL
//! listing within the same call.
//!
//! Deletions are reconciled two ways: records flagged `metadata.deleted` in
//! incremental results are removed, and a FULL pass that reaches its last
//! page prunes every row it did not rewrite.

use chrono::Utc;
use gwcli_core::{Error, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::ContactCache;
use crate::contact::ContactFields;
use crate::source::{ContactSource, DEFAULT_PAGE_SIZE, ListOutcome, ListRequest};

/// Parameters of one sync call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    /// Ignore the stored cursor and list everything.
    pub full: bool,
    /// Continues a paged listing started by a previous call.
    pub page_token: Option<String>,
    pub page_size: u32,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            full: false,
            page_token: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl SyncOptions {
    /// Options for the page after `outcome`, keeping the same mode.
    pub fn next_page(&self, outcome: &SyncOutcome) -> Self {
        Self {
            full: outcome.full_sync,
            page_token: outcome.next_page_token.clone(),
            page_size: self.page_size,
        }
    }
}

/// Result of one sync call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncOutcome {
    /// Records written to the cache.
    pub synced: usize,
    /// Rows deleted, by tombstone or by full-pass pruning.
    pub removed: usize,
    /// Cursor returned by the source, if any.
    pub sync_token: Option<String>,
    pub full_sync: bool,
    pub next_page_token: Option<String>,
}

impl SyncOutcome {
    pub fn has_more(&self) -> bool {
        self.next_page_token.is_some()
    }
}

pub struct SyncEngine<'a, S> {
    cache: &'a ContactCache,
    source: &'a S,
}

impl<'a, S: ContactSource> SyncEngine<'a, S> {
    pub fn new(cache: &'a ContactCache, source: &'a S) -> Self {
        Self { cache, source }
    }

    /// Syncs one page.
    pub fn sync(&self, options: &SyncOptions) -> Result<SyncOutcome> {
        let cursor = if options.full {
            None
        } else {
            self.cache.get_sync_token()?
        };
        let full = cursor.is_none();

        if let Some(outcome) = self.sync_page(cursor, options.page_token.clone(), options.page_size)? {
            return Ok(outcome);
        }

        if full {
            return Err(Error::api("contact source rejected a full listing as expired"));
        }

        warn!("sync token expired, falling back to a full sync");
        self.sync_page(None, None, options.page_size)?
            .ok_or_else(|| Error::api("sync token expired again during the full resync"))
    }

    /// Returns `None` when the source reports the cursor as expired.
    fn sync_page(
        &self,
        cursor: Option<String>,
        page_token: Option<String>,
        page_size: u32,
    ) -> Result<Option<SyncOutcome>> {
        let full = cursor.is_none();
        let first_page = page_token.is_none();
        let request = ListRequest {
            sync_token: cursor,
            page_token,
            page_size,
        };
        debug!(
            "listing contacts ({}, first page: {})",
            if full { "full" } else { "incremental" },
            first_page
        );

        let page = match self.source.list_connections(&request)? {
            ListOutcome::Page(page) => page,
            ListOutcome::CursorExpired => return Ok(None),
        };

        if full && first_page {
            self.cache.begin_full_sync(Utc::now())?;
        }

        let mut outcome = SyncOutcome {
            full_sync: full,
            ..Default::default()
        };
        for record in &page.connections {
            let fields = match ContactFields::from_record(record) {
                Ok(fields) => fields,
                Err(e) => {
                    warn!("skipping contact record: {}", e);
                    continue;
                }
            };
            if fields.deleted {
                if self.cache.remove_contact(&fields.resource_name)? {
                    outcome.removed += 1;
                }
                continue;
            }
            self.cache.cache_contact(record)?;
            outcome.synced += 1;
        }

        let last_page = page.next_page_token.is_none();
        if full && last_page {
            outcome.removed += self.cache.finish_full_sync()?;
        }

        if let Some(token) = &page.next_sync_token {
            self.cache.set_sync_token(token)?;
        } else if last_page {
            self.cache.record_sync(None)?;
        }

        outcome.sync_token = page.next_sync_token;
        outcome.next_page_token = page.next_page_token;
        info!(
            "synced {} contacts, removed {} ({} sync)",
            outcome.synced,
            outcome.removed,
            if full { "full" } else { "incremental" }
        );
        Ok(Some(outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ContactPage;
    use chrono::Duration;
    use gwcli_core::ErrorKind;
    use serde_json::{Value, json};
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Source fake replaying scripted outcomes and recording requests.
    #[derive(Default)]
    struct ScriptedSource {
        responses: RefCell<VecDeque<Result<ListOutcome>>>,
        requests: RefCell<Vec<ListRequest>>,
    }

    impl ScriptedSource {
        fn new(responses: Vec<Result<ListOutcome>>) -> Self {
            Self {
                responses: RefCell::new(responses.into()),
                requests: RefCell::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<ListRequest> {
            self.requests.borrow().clone()
        }
    }

    impl ContactSource for ScriptedSource {
        fn list_connections(&self, request: &ListRequest) -> Result<ListOutcome> {
            self.requests.borrow_mut().push(request.clone());
            self.responses
                .borrow_mut()
                .pop_front()
                .expect("unexpected list_connections call")
        }
    }

    fn person(id: &str, name: &str) -> Value {
        json!({
            "resourceName": format!("people/{}", id),
            "names": [{"displayName": name}],
        })
    }

    fn page(
        connections: Vec<Value>,
        next_page_token: Option<&str>,
        next_sync_token: Option<&str>,
    ) -> Result<ListOutcome> {
        Ok(ListOutcome::Page(ContactPage {
            connections,
            next_page_token: next_page_token.map(String::from),
            next_sync_token: next_sync_token.map(String::from),
        }))
    }

    #[test]
    fn first_sync_is_full_and_stores_cursor() {
        let cache = ContactCache::open_in_memory().unwrap();
        let source = ScriptedSource::new(vec![page(
            vec![person("c1", "Alice"), person("c2", "Bob"), person("c3", "Carol")],
            None,
            Some("tok-2"),
        )]);

        let outcome = SyncEngine::new(&cache, &source)
            .sync(&SyncOptions::default())
            .unwrap();

        assert!(outcome.full_sync);
        assert_eq!(outcome.synced, 3);
        assert_eq!(outcome.sync_token.as_deref(), Some("tok-2"));
        assert!(!outcome.has_more());
        assert_eq!(cache.get_sync_token().unwrap().as_deref(), Some("tok-2"));
        assert_eq!(cache.count().unwrap(), 3);
        assert_eq!(source.requests()[0].sync_token, None);
    }

    #[test]
    fn stored_cursor_makes_sync_incremental() {
        let cache = ContactCache::open_in_memory().unwrap();
        cache.cache_contact(&person("c1", "Alice")).unwrap();
        cache.set_sync_token("tok-1").unwrap();
        let source = ScriptedSource::new(vec![page(vec![person("c2", "Bob")], None, Some("tok-2"))]);

        let outcome = SyncEngine::new(&cache, &source)
            .sync(&SyncOptions::default())
            .unwrap();

        assert!(!outcome.full_sync);
        assert_eq!(source.requests()[0].sync_token.as_deref(), Some("tok-1"));
        // incremental results never prune
        assert_eq!(cache.count().unwrap(), 2);
        assert_eq!(cache.get_sync_token().unwrap().as_deref(), Some("tok-2"));
    }

    #[test]
    fn expired_cursor_retries_once_as_full() {
        let cache = ContactCache::open_in_memory().unwrap();
        cache.set_sync_token("tok-1").unwrap();
        let source = ScriptedSource::new(vec![
            Ok(ListOutcome::CursorExpired),
            page(vec![person("c1", "Alice")], None, Some("tok-3")),
        ]);

        let outcome = SyncEngine::new(&cache, &source)
            .sync(&SyncOptions::default())
            .unwrap();

        let requests = source.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].sync_token.as_deref(), Some("tok-1"));
        assert_eq!(requests[1].sync_token, None);
        assert_eq!(requests[1].page_token, None);
        assert!(outcome.full_sync);
        assert_eq!(cache.get_sync_token().unwrap().as_deref(), Some("tok-3"));
    }

    #[test]
    fn second_expiry_is_api_error() {
        let cache = ContactCache::open_in_memory().unwrap();
        cache.set_sync_token("tok-1").unwrap();
        let source = ScriptedSource::new(vec![
            Ok(ListOutcome::CursorExpired),
            Ok(ListOutcome::CursorExpired),
        ]);

        let err = SyncEngine::new(&cache, &source)
            .sync(&SyncOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(source.requests().len(), 2);
        assert_eq!(cache.get_sync_token().unwrap().as_deref(), Some("tok-1"));
    }

    #[test]
    fn other_errors_propagate_without_retry() {
        let cache = ContactCache::open_in_memory().unwrap();
        cache.set_sync_token("tok-1").unwrap();
        let source = ScriptedSource::new(vec![Err(Error::authentication("token revoked"))]);

        let err = SyncEngine::new(&cache, &source)
            .sync(&SyncOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert_eq!(source.requests().len(), 1);
    }

    #[test]
    fn missing_cursor_leaves_stored_one() {
        let cache = ContactCache::open_in_memory().unwrap();
        cache.set_sync_token("tok-1").unwrap();
        let source = ScriptedSource::new(vec![page(vec![person("c1", "Alice")], None, None)]);

        SyncEngine::new(&cache, &source)
            .sync(&SyncOptions::default())
            .unwrap();
        assert_eq!(cache.get_sync_token().unwrap().as_deref(), Some("tok-1"));
    }

    #[test]
    fn tombstones_remove_rows() {
        let cache = ContactCache::open_in_memory().unwrap();
        cache.cache_contact(&person("c1", "Alice")).unwrap();
        cache.set_sync_token("tok-1").unwrap();
        let source = ScriptedSource::new(vec![page(
            vec![json!({"resourceName": "people/c1", "metadata": {"deleted": true}})],
            None,
            Some("tok-2"),
        )]);

        let outcome = SyncEngine::new(&cache, &source)
            .sync(&SyncOptions::default())
            .unwrap();
        assert_eq!(outcome.removed, 1);
        assert_eq!(outcome.synced, 0);
        assert_eq!(cache.count().unwrap(), 0);
    }

    #[test]
    fn paged_full_sync_prunes_at_the_end() {
        let cache = ContactCache::open_in_memory().unwrap();
        cache
            .cache_contact_at(&person("stale", "Gone"), Utc::now() - Duration::hours(2))
            .unwrap();
        let source = ScriptedSource::new(vec![
            page(vec![person("c1", "Alice")], Some("page-2"), None),
            page(vec![person("c2", "Bob")], None, Some("tok-9")),
        ]);
        let engine = SyncEngine::new(&cache, &source);

        let options = SyncOptions {
            full: true,
            ..Default::default()
        };
        let first = engine.sync(&options).unwrap();
        assert!(first.has_more());
        assert_eq!(first.removed, 0);
        // stale row survives until the pass completes
        assert!(cache.get_from_cache("people/stale").unwrap().is_some());

        let second = engine.sync(&options.next_page(&first)).unwrap();
        assert!(!second.has_more());
        assert_eq!(second.removed, 1);
        assert!(cache.get_from_cache("people/stale").unwrap().is_none());
        assert_eq!(cache.count().unwrap(), 2);

        let requests = source.requests();
        assert_eq!(requests[1].page_token.as_deref(), Some("page-2"));
        assert_eq!(requests[1].sync_token, None);
    }

    #[test]
    fn malformed_records_are_skipped() {
        let cache = ContactCache::open_in_memory().unwrap();
        let source = ScriptedSource::new(vec![page(
            vec![json!({"names": [{"displayName": "No id"}]}), person("c1", "Alice")],
            None,
            Some("tok"),
        )]);

        let outcome = SyncEngine::new(&cache, &source)
            .sync(&SyncOptions::default())
            .unwrap();
        assert_eq!(outcome.synced, 1);
    }

    #[test]
    fn sync_marks_cache_fresh() {
        let cache = ContactCache::open_in_memory().unwrap();
        assert!(cache.should_sync(24).unwrap());
        let source = ScriptedSource::new(vec![page(vec![], None, None)]);

        SyncEngine::new(&cache, &source)
            .sync(&SyncOptions::default())
            .unwrap();
        assert!(!cache.should_sync(24).unwrap());
    }
}
