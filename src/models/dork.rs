//! Dork record data structures.

use serde::{Deserialize, Serialize};

/// One deduplicated search-query entry with metadata.
///
/// `query_text` is the unique key across the whole store; `id` is assigned
/// monotonically on insert and never reused.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Dork {
    /// Monotonic numeric identifier
    pub id: u64,

    /// Display title (the GHDB feed reuses the query text here)
    pub title: String,

    /// The raw search query, unique across the store
    pub query_text: String,

    /// Category name
    pub category: String,

    /// Publication date as reported by the feed
    pub date_published: Option<String>,

    /// Link back to the source entry
    pub source_url: Option<String>,

    /// Local timestamp of insertion
    pub date_added: String,

    /// Favorite flag, toggled by the caller
    #[serde(default)]
    pub is_favorite: bool,
}

/// Candidate record for insertion, before an id and timestamp are assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDork {
    pub title: String,
    pub query_text: String,
    pub category: String,
    pub date_published: Option<String>,
    pub source_url: Option<String>,
}

/// A category, created implicitly the first time a record references it.
///
/// `ordinal` is assignment order and is used only for stable display,
/// never for identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub ordinal: u64,
}

/// One completed synchronization pass, appended to the run log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncRun {
    pub timestamp: String,
    pub new_record_count: u64,
}
