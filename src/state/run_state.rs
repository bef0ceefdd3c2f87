//! Run-wide state shared by all category tasks
//!
//! The emitted canonical URL set, the counters and the two record writers
//! live behind one mutex. The lock is only taken for in-memory updates and
//! the synchronous record write, never across an `.await`.

use crate::output::{DetailRecord, FailureRecord, JsonlWriter, OutputPaths, RunManifest};
use crate::SeedError;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Result of reporting one discovered product URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailOutcome {
    /// First sighting of the canonical URL, written to the detail file
    Persisted,
    /// Canonical URL was already emitted in this run
    Duplicate,
    /// Product cap already met, nothing written
    CapReached,
    /// The record could not be written
    WriteFailed,
}

/// Snapshot of the run counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    pub total_list_pages_fetched: u64,
    pub total_detail_urls: u64,
    pub total_canonical_urls: u64,
    pub failures_count: u64,
}

#[derive(Debug)]
struct Inner {
    emitted: HashSet<String>,
    total_list_pages_fetched: u64,
    total_detail_urls: u64,
    failures_count: u64,
    detail_writer: JsonlWriter,
    failure_writer: JsonlWriter,
}

/// Shared state of one collect run
#[derive(Debug)]
pub struct RunState {
    seed_run_id: String,
    started_at: DateTime<Utc>,
    product_cap: Option<usize>,
    stopped: AtomicBool,
    inner: Mutex<Inner>,
}

impl RunState {
    /// Opens (truncating) the detail and failure files and starts a new run
    ///
    /// # Arguments
    ///
    /// * `paths` - Output file locations; the directory must exist
    /// * `product_cap` - Maximum distinct canonical URLs to persist
    ///
    /// # Returns
    ///
    /// * `Ok(RunState)` - Writers are open, run id and start time assigned
    /// * `Err(SeedError::OutputSetup)` - An output file could not be opened
    pub fn create(paths: &OutputPaths, product_cap: Option<usize>) -> Result<Self, SeedError> {
        let detail_writer = JsonlWriter::create(&paths.detail_urls)?;
        let failure_writer = JsonlWriter::create(&paths.seed_failures)?;

        Ok(Self {
            seed_run_id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            product_cap,
            stopped: AtomicBool::new(false),
            inner: Mutex::new(Inner {
                emitted: HashSet::new(),
                total_list_pages_fetched: 0,
                total_detail_urls: 0,
                failures_count: 0,
                detail_writer,
                failure_writer,
            }),
        })
    }

    pub fn seed_run_id(&self) -> &str {
        &self.seed_run_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Returns true once the product cap has been reached
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Reports one discovered product URL
    ///
    /// Every call counts as a discovery. The record is written only for the
    /// first occurrence of its canonical URL and only while the product cap
    /// is not met, so the detail file never holds more lines than the cap.
    pub fn record_detail(&self, record: &DetailRecord) -> DetailOutcome {
        let mut inner = self.lock();
        inner.total_detail_urls += 1;

        if inner.emitted.contains(&record.canonical_url) {
            return DetailOutcome::Duplicate;
        }
        if self.cap_met(inner.emitted.len()) {
            self.raise_stop();
            return DetailOutcome::CapReached;
        }

        if let Err(e) = inner.detail_writer.write(record) {
            tracing::error!(
                "Failed to write detail record for {} to {}: {}",
                record.canonical_url,
                inner.detail_writer.path().display(),
                e
            );
            return DetailOutcome::WriteFailed;
        }
        inner.emitted.insert(record.canonical_url.clone());

        if self.cap_met(inner.emitted.len()) {
            self.raise_stop();
        }
        DetailOutcome::Persisted
    }

    /// Writes a failure record and counts it
    ///
    /// The failure is counted even when the record cannot be written.
    pub fn record_failure(&self, record: &FailureRecord) {
        tracing::warn!(
            "{} at {}: {}",
            record.failure_category,
            record.list_page_url,
            record.message
        );

        let mut inner = self.lock();
        inner.failures_count += 1;
        if let Err(e) = inner.failure_writer.write(record) {
            tracing::error!(
                "Failed to write failure record to {}: {}",
                inner.failure_writer.path().display(),
                e
            );
        }
    }

    /// Counts one list page fetched
    pub fn increment_pages_fetched(&self) {
        self.lock().total_list_pages_fetched += 1;
    }

    /// Counts a failure that has no record, such as a crashed category task
    pub fn count_unrecorded_failure(&self) {
        self.lock().failures_count += 1;
    }

    /// Returns a consistent snapshot of the counters
    pub fn counters(&self) -> RunCounters {
        let inner = self.lock();
        RunCounters {
            total_list_pages_fetched: inner.total_list_pages_fetched,
            total_detail_urls: inner.total_detail_urls,
            total_canonical_urls: inner.emitted.len() as u64,
            failures_count: inner.failures_count,
        }
    }

    /// Builds the final manifest from the current counters
    pub fn manifest(
        &self,
        input_category_urls: &[String],
        config_hash: &str,
        output_paths: &OutputPaths,
    ) -> RunManifest {
        let counters = self.counters();
        RunManifest {
            seed_run_id: self.seed_run_id.clone(),
            started_at: self.started_at,
            finished_at: Utc::now(),
            input_category_urls: input_category_urls.to_vec(),
            total_list_pages_fetched: counters.total_list_pages_fetched,
            total_detail_urls: counters.total_detail_urls,
            total_canonical_urls: counters.total_canonical_urls,
            failures_count: counters.failures_count,
            config_hash: config_hash.to_string(),
            output_paths: output_paths.clone(),
        }
    }

    fn cap_met(&self, emitted: usize) -> bool {
        self.product_cap.is_some_and(|cap| emitted >= cap)
    }

    fn raise_stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            tracing::info!(
                "Product cap of {} reached, stopping further fetches",
                self.product_cap.unwrap_or_default()
            );
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
