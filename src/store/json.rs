//! Single-file JSON store implementation.
//!
//! Keeps the full corpus in memory with a hash-set index over
//! `query_text` for O(1) duplicate checks, and persists snapshots
//! atomically to one JSON file.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{Category, Dork, NewDork, SyncRun};
use crate::store::StoreStats;
use crate::utils::now_stamp;

/// Persisted shape of the store file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreData {
    #[serde(default)]
    dorks: Vec<Dork>,

    #[serde(default)]
    categories: Vec<Category>,

    #[serde(default)]
    sync_runs: Vec<SyncRun>,
}

/// Single-file JSON store backend.
pub struct JsonStore {
    path: PathBuf,
    data: StoreData,
    index: HashSet<String>,
}

impl JsonStore {
    /// Open a store backed by the given file, rebuilding the in-memory
    /// index from its contents.
    ///
    /// A missing file starts an empty store; an unreadable file starts
    /// fresh with a warning rather than failing the whole application.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(data) => data,
                Err(e) => {
                    log::warn!(
                        "Store file {} is unreadable: {}. Starting fresh.",
                        path.display(),
                        e
                    );
                    StoreData::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreData::default(),
            Err(e) => return Err(AppError::Io(e)),
        };

        let index = data.dorks.iter().map(|d| d.query_text.clone()).collect();
        Ok(Self { path, data, index })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a record with this query text already exists.
    pub fn exists(&self, query_text: &str) -> bool {
        self.index.contains(query_text)
    }

    /// Insert a record unless its query text is already present.
    ///
    /// Returns `false` without modifying state on a duplicate. Otherwise
    /// allocates the next id, stamps `date_added`, creates the category
    /// if unseen, and returns `true`. The insert is in-memory only; call
    /// [`snapshot`](Self::snapshot) to persist.
    pub fn insert(&mut self, dork: NewDork) -> bool {
        if self.index.contains(&dork.query_text) {
            return false;
        }

        let id = self.data.dorks.last().map_or(1, |d| d.id + 1);

        if !self.data.categories.iter().any(|c| c.name == dork.category) {
            let ordinal = self.data.categories.len() as u64 + 1;
            self.data.categories.push(Category {
                name: dork.category.clone(),
                ordinal,
            });
        }

        self.index.insert(dork.query_text.clone());
        self.data.dorks.push(Dork {
            id,
            title: dork.title,
            query_text: dork.query_text,
            category: dork.category,
            date_published: dork.date_published,
            source_url: dork.source_url,
            date_added: now_stamp(),
            is_favorite: false,
        });

        true
    }

    /// Look up a record by id.
    pub fn get(&self, id: u64) -> Option<&Dork> {
        self.data.dorks.iter().find(|d| d.id == id)
    }

    /// Case-insensitive substring search over title and query text,
    /// in insertion order.
    pub fn search_by_keyword(&self, keyword: &str) -> Vec<&Dork> {
        let needle = keyword.to_lowercase();
        self.data
            .dorks
            .iter()
            .filter(|d| {
                d.title.to_lowercase().contains(&needle)
                    || d.query_text.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Records in the given category (exact match), in insertion order.
    pub fn list_by_category(&self, category: &str) -> Vec<&Dork> {
        self.data
            .dorks
            .iter()
            .filter(|d| d.category == category)
            .collect()
    }

    /// All categories, sorted lexicographically by name.
    pub fn list_categories(&self) -> Vec<Category> {
        let mut categories = self.data.categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        categories
    }

    /// Toggle the favorite flag on a record. Returns `false` when the id
    /// is unknown. Best-effort; the change is persisted on the next
    /// snapshot.
    pub fn set_favorite(&mut self, id: u64, value: bool) -> bool {
        match self.data.dorks.iter_mut().find(|d| d.id == id) {
            Some(dork) => {
                dork.is_favorite = value;
                true
            }
            None => false,
        }
    }

    /// Append a completed sync run to the log and persist it.
    pub async fn log_run(&mut self, new_count: u64) -> Result<()> {
        self.data.sync_runs.push(SyncRun {
            timestamp: now_stamp(),
            new_record_count: new_count,
        });
        self.snapshot().await
    }

    /// Timestamp of the most recent sync run, or `"Never"`.
    pub fn last_run_time(&self) -> &str {
        self.data
            .sync_runs
            .last()
            .map_or("Never", |run| run.timestamp.as_str())
    }

    /// Aggregate corpus counts.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            total_dorks: self.data.dorks.len() as u64,
            total_categories: self.data.categories.len() as u64,
        }
    }

    /// Durably persist the current in-memory state.
    ///
    /// Serializes to a temp file next to the target and renames it into
    /// place, so a failure mid-write leaves the previous snapshot intact.
    pub async fn snapshot(&self) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(&self.data)?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::storage(format!("create {}: {}", parent.display(), e)))?;
        }

        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp)
            .await
            .map_err(|e| AppError::storage(format!("create {}: {}", tmp.display(), e)))?;
        file.write_all(&bytes)
            .await
            .map_err(|e| AppError::storage(format!("write {}: {}", tmp.display(), e)))?;
        file.flush()
            .await
            .map_err(|e| AppError::storage(format!("flush {}: {}", tmp.display(), e)))?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| AppError::storage(format!("rename to {}: {}", self.path.display(), e)))?;
        Ok(())
    }
}
