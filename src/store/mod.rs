//! Persistence contract for traffic records.
//!
//! [`RecordStore`] is everything the analytics core needs from storage.
//! [`MemoryStore`] keeps records in process; [`CsvStore`] additionally appends
//! every committed record to a CSV file and replays it on open.

mod csv_file;
mod memory;

pub use csv_file::CsvStore;
pub use memory::MemoryStore;

use chrono::NaiveDateTime;
use std::collections::BTreeMap;

use crate::model::TrafficRecord;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists for timestamp {0}")]
    Duplicate(NaiveDateTime),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("corrupt store: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Storage capabilities required by the analytics core.
///
/// Implementations must make the uniqueness check and the insert a single
/// atomic step, so concurrent writers can never both commit the same
/// timestamp.
pub trait RecordStore: Send + Sync {
    /// Inserts one record, failing with [`StoreError::Duplicate`] if its
    /// timestamp is taken.
    fn save(&self, record: TrafficRecord) -> StoreResult<TrafficRecord>;

    /// Inserts every record or none of them. Duplicates against existing data
    /// or within the batch reject the whole batch.
    fn save_batch(&self, records: Vec<TrafficRecord>) -> StoreResult<usize>;

    fn find_all(&self) -> StoreResult<Vec<TrafficRecord>>;

    fn find_all_ordered_by_timestamp(&self) -> StoreResult<Vec<TrafficRecord>>;

    /// Records with `start <= timestamp < end`, ascending by timestamp.
    fn find_by_timestamp_range(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> StoreResult<Vec<TrafficRecord>>;

    /// The `k` busiest records, ordered by [`TrafficRecord::busiest_first`].
    fn find_top_by_count(&self, k: usize) -> StoreResult<Vec<TrafficRecord>>;

    fn count(&self) -> StoreResult<usize>;
}

/// Checks a batch against the current index without touching it.
pub(crate) fn check_batch(
    index: &BTreeMap<NaiveDateTime, TrafficRecord>,
    records: &[TrafficRecord],
) -> StoreResult<()> {
    let mut seen = std::collections::BTreeSet::new();
    for r in records {
        if index.contains_key(&r.timestamp) || !seen.insert(r.timestamp) {
            return Err(StoreError::Duplicate(r.timestamp));
        }
    }
    Ok(())
}

pub(crate) fn top_by_count(
    index: &BTreeMap<NaiveDateTime, TrafficRecord>,
    k: usize,
) -> Vec<TrafficRecord> {
    let mut all: Vec<TrafficRecord> = index.values().cloned().collect();
    all.sort_by(TrafficRecord::busiest_first);
    all.truncate(k);
    all
}

pub(crate) fn range(
    index: &BTreeMap<NaiveDateTime, TrafficRecord>,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Vec<TrafficRecord> {
    if start >= end {
        return Vec::new();
    }
    index.range(start..end).map(|(_, r)| r.clone()).collect()
}
