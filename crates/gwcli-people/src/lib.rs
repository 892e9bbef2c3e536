//! Contact cache and incremental sync against the Google People API.

pub mod cache;
pub mod contact;
pub mod source;
pub mod sync;

pub use cache::{ContactCache, SortKey};
pub use contact::{CachedContact, ContactFields};
pub use source::{
    ContactPage, ContactSource, DEFAULT_PAGE_SIZE, ListOutcome, ListRequest, MAX_PAGE_SIZE,
    PeopleClient,
};
pub use sync::{SyncEngine, SyncOptions, SyncOutcome};
