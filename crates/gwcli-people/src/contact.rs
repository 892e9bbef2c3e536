//! Typed view over People API person records.

use chrono::{DateTime, Utc};
use gwcli_core::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The denormalized columns pulled out of a person record.
///
/// Each list field (names, emails, ...) contributes its first entry; a
/// missing list or value becomes the empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactFields {
    pub resource_name: String,
    pub display_name: String,
    pub email: String,
    pub phone: String,
    pub organization: String,
    /// `updateTime` of the first metadata source.
    pub last_modified: Option<String>,
    /// Set on incremental results for contacts removed remotely.
    pub deleted: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Person {
    resource_name: Option<String>,
    names: Vec<Name>,
    email_addresses: Vec<FieldValue>,
    phone_numbers: Vec<FieldValue>,
    organizations: Vec<Organization>,
    metadata: Option<PersonMetadata>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Name {
    display_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FieldValue {
    value: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Organization {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PersonMetadata {
    sources: Vec<Source>,
    deleted: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Source {
    update_time: Option<String>,
}

fn first_or_empty<T>(items: Vec<T>, pick: impl FnOnce(T) -> Option<String>) -> String {
    items.into_iter().next().and_then(pick).unwrap_or_default()
}

impl ContactFields {
    /// Extracts the cached columns from a raw person record.
    pub fn from_record(record: &Value) -> Result<Self> {
        let person = Person::deserialize(record)
            .map_err(|e| Error::validation("malformed contact record").with_source(e))?;

        let resource_name = person
            .resource_name
            .filter(|name| !name.is_empty())
            .ok_or_else(|| Error::validation("contact record has no resourceName"))?;
        let metadata = person.metadata.unwrap_or_default();

        Ok(Self {
            resource_name,
            display_name: first_or_empty(person.names, |n| n.display_name),
            email: first_or_empty(person.email_addresses, |e| e.value),
            phone: first_or_empty(person.phone_numbers, |p| p.value),
            organization: first_or_empty(person.organizations, |o| o.name),
            last_modified: metadata.sources.into_iter().next().and_then(|s| s.update_time),
            deleted: metadata.deleted,
        })
    }
}

/// A row of the contact cache.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CachedContact {
    pub resource_name: String,
    pub display_name: String,
    pub email: String,
    pub phone: String,
    pub organization: String,
    /// The remote record exactly as it was received.
    pub full_record: Value,
    pub last_modified: Option<String>,
    pub cached_at: DateTime<Utc>,
}
