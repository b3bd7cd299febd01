//! Wire types for the GHDB page source.
//!
//! The feed answers DataTables-style window requests with a JSON body of
//! the shape `{recordsTotal, data: [{id, date, url_title, category}]}`.

use serde::Deserialize;

use crate::utils::strip_markup;

use super::NewDork;

/// Base URL for source links back into the GHDB.
pub const GHDB_ENTRY_URL: &str = "https://www.exploit-db.com/ghdb";

/// One page window returned by the remote feed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DorkPage {
    /// Advertised total record count. Advisory only; a short page ends
    /// pagination regardless of this value.
    #[serde(rename = "recordsTotal", default)]
    pub records_total: u64,

    /// Raw entries in this window, newest first.
    #[serde(default)]
    pub data: Vec<RawEntry>,
}

/// One raw item as delivered by the feed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEntry {
    #[serde(default)]
    pub id: Option<u64>,

    #[serde(default)]
    pub date: Option<String>,

    /// Query text, usually wrapped in an anchor tag
    #[serde(default)]
    pub url_title: String,

    #[serde(default)]
    pub category: Option<RawCategory>,
}

/// Nested category object on a raw entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCategory {
    #[serde(default)]
    pub cat_title: String,
}

impl RawEntry {
    /// Normalize a raw feed item into an insertion candidate.
    ///
    /// Strips the anchor markup around the query text, defaults the
    /// category to `"Unknown"` when absent, and derives the source link
    /// from the entry id.
    pub fn normalize(&self) -> NewDork {
        let query_text = strip_markup(&self.url_title);
        let category = self
            .category
            .as_ref()
            .map(|c| c.cat_title.clone())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "Unknown".to_string());

        NewDork {
            title: query_text.clone(),
            query_text,
            category,
            date_published: self.date.clone(),
            source_url: self.id.map(|id| format!("{GHDB_ENTRY_URL}/{id}")),
        }
    }
}
