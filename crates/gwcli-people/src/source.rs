//! Remote side of the contact sync: the People API connections listing.

use gwcli_auth::ApiClient;
use gwcli_core::{Error, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Base URL of the People API v1.
pub const PEOPLE_API_BASE: &str = "https://people.googleapis.com/v1";

/// Fields requested for every person; enough to fill the cache columns and
/// detect deletions.
pub const PERSON_FIELDS: &str = "names,emailAddresses,phoneNumbers,organizations,metadata";

pub const DEFAULT_PAGE_SIZE: u32 = 100;
/// Largest page the API accepts.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// One call to the connections listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    /// Cursor for an incremental listing; `None` requests a full listing.
    pub sync_token: Option<String>,
    pub page_token: Option<String>,
    pub page_size: u32,
}

impl Default for ListRequest {
    fn default() -> Self {
        Self {
            sync_token: None,
            page_token: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// A page of person records.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactPage {
    pub connections: Vec<Value>,
    pub next_page_token: Option<String>,
    /// Only present on the last page of a listing.
    pub next_sync_token: Option<String>,
}

/// What a listing call produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ListOutcome {
    Page(ContactPage),
    /// The sync token is no longer accepted; a full listing is required.
    CursorExpired,
}

/// Anything that can list a user's contacts.
pub trait ContactSource {
    fn list_connections(&self, request: &ListRequest) -> Result<ListOutcome>;
}

/// [`ContactSource`] backed by the People API.
#[derive(Debug, Clone)]
pub struct PeopleClient {
    api: ApiClient,
    base_url: String,
}

impl PeopleClient {
    pub fn new(api: ApiClient) -> Self {
        Self::with_base_url(api, PEOPLE_API_BASE)
    }

    pub fn with_base_url(api: ApiClient, base_url: impl Into<String>) -> Self {
        Self {
            api,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

/// 410 Gone, or a 400 naming the expired token, means the cursor is dead.
fn is_expired_cursor(status: u16, body: &str) -> bool {
    status == 410 || (status == 400 && body.contains("EXPIRED_SYNC_TOKEN"))
}

impl ContactSource for PeopleClient {
    fn list_connections(&self, request: &ListRequest) -> Result<ListOutcome> {
        if request.page_size == 0 || request.page_size > MAX_PAGE_SIZE {
            return Err(Error::validation(format!(
                "page size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        let mut query = vec![
            ("personFields", PERSON_FIELDS.to_string()),
            ("pageSize", request.page_size.to_string()),
            ("requestSyncToken", "true".to_string()),
        ];
        if let Some(token) = &request.sync_token {
            query.push(("syncToken", token.clone()));
        }
        if let Some(token) = &request.page_token {
            query.push(("pageToken", token.clone()));
        }

        let url = format!("{}/people/me/connections", self.base_url);
        let response = self.api.get(&url, &query)?;

        if request.sync_token.is_some() && is_expired_cursor(response.status, &response.body) {
            debug!("sync token rejected with HTTP {}", response.status);
            return Ok(ListOutcome::CursorExpired);
        }

        let page: ContactPage = response.json()?;
        debug!(
            "listed {} connections (more pages: {})",
            page.connections.len(),
            page.next_page_token.is_some()
        );
        Ok(ListOutcome::Page(page))
    }
}
