//! Store abstractions for the local dork corpus.
//!
//! A single-file JSON store backs the whole corpus:
//!
//! ```text
//! {data_dir}/
//! ├── config.toml           # Application configuration
//! └── dorks.json            # Records, categories, and sync run log
//! ```
//!
//! The store is single-writer: only the sync engine mutates it, readers
//! run between engine calls. In-memory state is the source of truth;
//! `snapshot` persists it atomically (write to temp, then rename), so a
//! crash never corrupts the previous durable state.

pub mod json;

// Re-export for convenience
pub use json::JsonStore;

/// Aggregate corpus counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    /// Total records in the store
    pub total_dorks: u64,
    /// Total distinct categories
    pub total_categories: u64,
}
