//! Synchronization engine.
//!
//! Orchestrates full and incremental synchronization runs against a
//! [`PageSource`], owning the dedup policy, pacing, checkpointing, and
//! retry/backoff. Exactly one run can be active at a time: both entry
//! points take `&mut self`, so exclusivity is enforced at compile time.

use std::time::Duration;

use crate::error::Result;
use crate::models::{DorkPage, SyncConfig};
use crate::store::JsonStore;
use crate::sync::source::PageSource;

/// Summary of a completed full synchronization run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Records newly inserted during this run
    pub new_count: u64,
    /// Pages fetched and processed
    pub pages_fetched: u32,
    /// Raw records processed (including duplicates)
    pub records_seen: u64,
    /// Total advertised by the feed at the start of the run
    pub records_total: u64,
}

/// Engine driving synchronization runs between a page source and the store.
pub struct SyncEngine<S: PageSource> {
    source: S,
    config: SyncConfig,
}

impl<S: PageSource> SyncEngine<S> {
    /// Create an engine over the given page source.
    pub fn new(source: S, config: SyncConfig) -> Self {
        Self { source, config }
    }

    /// Fetch every page of the feed, inserting unseen records.
    ///
    /// The first page doubles as the count request. Pagination continues
    /// until the offset reaches the advertised total or the feed returns
    /// a short or empty page; the advertised total is advisory, not
    /// authoritative. The store is snapshotted every
    /// `checkpoint_interval` pages, bounding data loss on a crash, and a
    /// sync run is logged on completion. On an unrecoverable page
    /// failure the run aborts with an error; records persisted so far
    /// are kept, never rolled back.
    pub async fn full_sync(&mut self, store: &mut JsonStore) -> Result<SyncReport> {
        let page_size = self.config.page_size;

        let mut page = self.fetch_with_retry(0, page_size).await?;
        let records_total = page.records_total;
        let mut report = SyncReport {
            records_total,
            ..SyncReport::default()
        };

        if records_total == 0 {
            log::warn!("Feed advertises no records; nothing to sync");
            store.log_run(0).await?;
            return Ok(report);
        }

        log::info!("Feed advertises {records_total} records; starting full sync");

        let mut offset = 0u64;
        let mut want = page_size.min(records_total);
        let mut pages_since_checkpoint = 0u32;

        loop {
            let got = page.data.len() as u64;
            if got == 0 {
                log::warn!("Empty page at offset {offset}; treating as end of data");
                break;
            }

            for raw in &page.data {
                if store.insert(raw.normalize()) {
                    report.new_count += 1;
                }
            }
            report.pages_fetched += 1;
            report.records_seen += got;
            offset += got;

            pages_since_checkpoint += 1;
            if pages_since_checkpoint >= self.config.checkpoint_interval {
                store.snapshot().await?;
                pages_since_checkpoint = 0;
            }

            if got < want {
                log::warn!(
                    "Short page at offset {}: got {got} of {want}; treating as end of data",
                    offset - got
                );
                break;
            }
            if offset >= records_total {
                break;
            }

            if self.config.page_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.page_delay_ms)).await;
            }

            want = page_size.min(records_total - offset);
            page = self.fetch_with_retry(offset, want).await?;
        }

        // log_run persists the full state along with the run entry.
        store.log_run(report.new_count).await?;
        log::info!(
            "Full sync complete: {} new records across {} pages",
            report.new_count,
            report.pages_fetched
        );
        Ok(report)
    }

    /// Fetch the newest page only, inserting unseen records.
    ///
    /// The feed orders records most-recent-first, but that ordering
    /// jitters, so the entire page is processed rather than stopping at
    /// the first duplicate. A run is logged only when something new was
    /// inserted; a request failure yields `new_count = 0` without
    /// logging.
    pub async fn incremental_sync(&mut self, store: &mut JsonStore) -> Result<u64> {
        let page = match self.fetch_with_retry(0, self.config.page_size).await {
            Ok(page) => page,
            Err(e) => {
                log::warn!("Incremental sync request failed: {e}");
                return Ok(0);
            }
        };

        let mut new_count = 0u64;
        for raw in &page.data {
            if store.insert(raw.normalize()) {
                new_count += 1;
            }
        }

        if new_count > 0 {
            store.log_run(new_count).await?;
            log::info!("Incremental sync added {new_count} new records");
        } else {
            log::info!("Incremental sync found no new records");
        }
        Ok(new_count)
    }

    /// Fetch one page, retrying transient failures with increasing delay.
    async fn fetch_with_retry(&self, offset: u64, length: u64) -> Result<DorkPage> {
        let mut attempt = 0u32;
        loop {
            match self.source.fetch_page(offset, length).await {
                Ok(page) => return Ok(page),
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    attempt += 1;
                    let delay =
                        Duration::from_millis(self.config.retry_delay_ms * u64::from(attempt));
                    log::warn!(
                        "Page request at offset {offset} failed (attempt {attempt}/{}): {e}. \
                         Retrying in {delay:?}.",
                        self.config.max_retries
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use tempfile::TempDir;

    use super::*;
    use crate::error::AppError;
    use crate::models::{RawCategory, RawEntry};

    fn entry(id: u64, query: &str, category: &str) -> RawEntry {
        RawEntry {
            id: Some(id),
            date: Some("2024-01-01".to_string()),
            url_title: format!(r#"<a href="/ghdb/{id}">{query}</a>"#),
            category: Some(RawCategory {
                cat_title: category.to_string(),
            }),
        }
    }

    fn test_config(page_size: u64) -> SyncConfig {
        SyncConfig {
            page_size,
            page_delay_ms: 0,
            checkpoint_interval: 4,
            max_retries: 2,
            retry_delay_ms: 0,
            ..SyncConfig::default()
        }
    }

    /// Fixed feed serving slices of a static entry list, recording each
    /// requested window.
    struct StaticSource {
        records_total: u64,
        entries: Vec<RawEntry>,
        requests: Mutex<Vec<(u64, u64)>>,
    }

    impl StaticSource {
        fn new(records_total: u64, entries: Vec<RawEntry>) -> Self {
            Self {
                records_total,
                entries,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<(u64, u64)> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageSource for StaticSource {
        async fn fetch_page(&self, offset: u64, length: u64) -> Result<DorkPage> {
            self.requests.lock().unwrap().push((offset, length));
            let start = (offset as usize).min(self.entries.len());
            let end = (start + length as usize).min(self.entries.len());
            Ok(DorkPage {
                records_total: self.records_total,
                data: self.entries[start..end].to_vec(),
            })
        }
    }

    /// Feed that fails a fixed number of times before serving.
    struct FlakySource {
        inner: StaticSource,
        failures_left: AtomicU32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl PageSource for FlakySource {
        async fn fetch_page(&self, offset: u64, length: u64) -> Result<DorkPage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(AppError::transient("connection reset"));
            }
            self.inner.fetch_page(offset, length).await
        }
    }

    async fn open_store(tmp: &TempDir) -> JsonStore {
        JsonStore::open(tmp.path().join("dorks.json")).await.unwrap()
    }

    #[tokio::test]
    async fn test_full_sync_paginates_to_advertised_total() {
        let source = StaticSource::new(
            3,
            vec![
                entry(1, "inurl:admin", "Footholds"),
                entry(2, "filetype:env", "Files"),
                entry(3, "intitle:webcam", "Devices"),
            ],
        );
        let tmp = TempDir::new().unwrap();
        let mut store = open_store(&tmp).await;
        let mut engine = SyncEngine::new(source, test_config(2));

        let report = engine.full_sync(&mut store).await.unwrap();
        assert_eq!(report.new_count, 3);
        assert_eq!(report.records_seen, 3);
        assert_eq!(report.pages_fetched, 2);

        // The count request doubles as the first data page; the last
        // window is clamped to the remaining record.
        assert_eq!(engine.source.requests(), vec![(0, 2), (2, 1)]);
    }

    #[tokio::test]
    async fn test_full_sync_is_idempotent() {
        let entries = vec![
            entry(1, "inurl:admin", "Footholds"),
            entry(2, "filetype:env", "Files"),
            entry(3, "intitle:webcam", "Devices"),
        ];
        let tmp = TempDir::new().unwrap();
        let mut store = open_store(&tmp).await;

        let mut engine = SyncEngine::new(StaticSource::new(3, entries.clone()), test_config(2));
        let first = engine.full_sync(&mut store).await.unwrap();
        assert_eq!(first.new_count, 3);

        let mut engine = SyncEngine::new(StaticSource::new(3, entries), test_config(2));
        let second = engine.full_sync(&mut store).await.unwrap();
        assert_eq!(second.new_count, 0);
        assert_eq!(store.stats().total_dorks, 3);
    }

    #[tokio::test]
    async fn test_full_sync_stops_on_short_page() {
        // Feed advertises 5 records but only has 3; the short page at
        // offset 2 ends the run.
        let source = StaticSource::new(
            5,
            vec![
                entry(1, "a", "X"),
                entry(2, "b", "X"),
                entry(3, "c", "X"),
            ],
        );
        let tmp = TempDir::new().unwrap();
        let mut store = open_store(&tmp).await;
        let mut engine = SyncEngine::new(source, test_config(2));

        let report = engine.full_sync(&mut store).await.unwrap();
        assert_eq!(report.records_seen, 3);
        assert_eq!(report.new_count, 3);
        assert_eq!(engine.source.requests(), vec![(0, 2), (2, 2)]);
    }

    #[tokio::test]
    async fn test_full_sync_stops_on_empty_page() {
        let source = StaticSource::new(10, Vec::new());
        let tmp = TempDir::new().unwrap();
        let mut store = open_store(&tmp).await;
        let mut engine = SyncEngine::new(source, test_config(2));

        let report = engine.full_sync(&mut store).await.unwrap();
        assert_eq!(report.new_count, 0);
        assert_eq!(report.pages_fetched, 0);
    }

    #[tokio::test]
    async fn test_full_sync_zero_total_finishes_clean() {
        let source = StaticSource::new(0, Vec::new());
        let tmp = TempDir::new().unwrap();
        let mut store = open_store(&tmp).await;
        let mut engine = SyncEngine::new(source, test_config(2));

        let report = engine.full_sync(&mut store).await.unwrap();
        assert_eq!(report.new_count, 0);
        assert_ne!(store.last_run_time(), "Never");
    }

    #[tokio::test]
    async fn test_full_sync_persists_records() {
        let source = StaticSource::new(2, vec![entry(1, "a", "X"), entry(2, "b", "Y")]);
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("dorks.json");
        let mut store = JsonStore::open(&path).await.unwrap();
        let mut engine = SyncEngine::new(source, test_config(2));

        engine.full_sync(&mut store).await.unwrap();

        let reloaded = JsonStore::open(&path).await.unwrap();
        assert_eq!(reloaded.stats().total_dorks, 2);
        assert_ne!(reloaded.last_run_time(), "Never");
    }

    #[tokio::test]
    async fn test_full_sync_retries_transient_failures() {
        let source = FlakySource {
            inner: StaticSource::new(1, vec![entry(1, "a", "X")]),
            failures_left: AtomicU32::new(2),
            calls: AtomicU32::new(0),
        };
        let tmp = TempDir::new().unwrap();
        let mut store = open_store(&tmp).await;
        let mut engine = SyncEngine::new(source, test_config(2));

        let report = engine.full_sync(&mut store).await.unwrap();
        assert_eq!(report.new_count, 1);
        assert_eq!(engine.source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_full_sync_aborts_after_retries_exhausted() {
        let source = FlakySource {
            inner: StaticSource::new(1, vec![entry(1, "a", "X")]),
            failures_left: AtomicU32::new(u32::MAX),
            calls: AtomicU32::new(0),
        };
        let tmp = TempDir::new().unwrap();
        let mut store = open_store(&tmp).await;
        let mut engine = SyncEngine::new(source, test_config(2));

        let result = engine.full_sync(&mut store).await;
        assert!(result.is_err());
        // Initial attempt plus max_retries.
        assert_eq!(engine.source.calls.load(Ordering::SeqCst), 3);
    }

    /// Protocol errors are not retried.
    struct BrokenSource {
        calls: AtomicU32,
    }

    #[async_trait]
    impl PageSource for BrokenSource {
        async fn fetch_page(&self, _offset: u64, _length: u64) -> Result<DorkPage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(AppError::protocol("body was not JSON"))
        }
    }

    #[tokio::test]
    async fn test_protocol_errors_are_not_retried() {
        let source = BrokenSource {
            calls: AtomicU32::new(0),
        };
        let tmp = TempDir::new().unwrap();
        let mut store = open_store(&tmp).await;
        let mut engine = SyncEngine::new(source, test_config(2));

        assert!(engine.full_sync(&mut store).await.is_err());
        assert_eq!(engine.source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_incremental_sync_processes_whole_page() {
        // Known and unknown records interleave; no early exit on the
        // first duplicate.
        let entries = vec![
            entry(1, "known-a", "X"),
            entry(2, "new-a", "X"),
            entry(3, "known-b", "X"),
            entry(4, "new-b", "X"),
        ];
        let tmp = TempDir::new().unwrap();
        let mut store = open_store(&tmp).await;
        for raw in [&entries[0], &entries[2]] {
            assert!(store.insert(raw.normalize()));
        }

        let mut engine = SyncEngine::new(StaticSource::new(4, entries), test_config(10));
        let new_count = engine.incremental_sync(&mut store).await.unwrap();
        assert_eq!(new_count, 2);
        assert_eq!(store.stats().total_dorks, 4);
    }

    #[tokio::test]
    async fn test_incremental_sync_all_known_does_not_log() {
        let entries = vec![entry(1, "known-a", "X"), entry(2, "known-b", "X")];
        let tmp = TempDir::new().unwrap();
        let mut store = open_store(&tmp).await;
        for raw in &entries {
            assert!(store.insert(raw.normalize()));
        }

        let mut engine = SyncEngine::new(StaticSource::new(2, entries), test_config(10));
        let new_count = engine.incremental_sync(&mut store).await.unwrap();
        assert_eq!(new_count, 0);
        assert_eq!(store.last_run_time(), "Never");
    }

    #[tokio::test]
    async fn test_incremental_sync_failure_returns_zero() {
        let source = FlakySource {
            inner: StaticSource::new(1, vec![entry(1, "a", "X")]),
            failures_left: AtomicU32::new(u32::MAX),
            calls: AtomicU32::new(0),
        };
        let tmp = TempDir::new().unwrap();
        let mut store = open_store(&tmp).await;
        let mut engine = SyncEngine::new(source, test_config(2));

        let new_count = engine.incremental_sync(&mut store).await.unwrap();
        assert_eq!(new_count, 0);
        assert_eq!(store.last_run_time(), "Never");
    }
}
