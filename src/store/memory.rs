use chrono::NaiveDateTime;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use tracing::debug;

use super::{RecordStore, StoreError, StoreResult, check_batch, range, top_by_count};
use crate::model::TrafficRecord;

/// In-process store keyed by timestamp.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<NaiveDateTime, TrafficRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn save(&self, record: TrafficRecord) -> StoreResult<TrafficRecord> {
        let mut records = self.records.write();
        if records.contains_key(&record.timestamp) {
            return Err(StoreError::Duplicate(record.timestamp));
        }
        records.insert(record.timestamp, record.clone());
        Ok(record)
    }

    fn save_batch(&self, batch: Vec<TrafficRecord>) -> StoreResult<usize> {
        let mut records = self.records.write();
        check_batch(&records, &batch)?;

        let n = batch.len();
        for r in batch {
            records.insert(r.timestamp, r);
        }
        debug!(inserted = n, total = records.len(), "Batch committed");
        Ok(n)
    }

    fn find_all(&self) -> StoreResult<Vec<TrafficRecord>> {
        Ok(self.records.read().values().cloned().collect())
    }

    fn find_all_ordered_by_timestamp(&self) -> StoreResult<Vec<TrafficRecord>> {
        // BTreeMap iteration is already timestamp-ascending
        self.find_all()
    }

    fn find_by_timestamp_range(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> StoreResult<Vec<TrafficRecord>> {
        Ok(range(&self.records.read(), start, end))
    }

    fn find_top_by_count(&self, k: usize) -> StoreResult<Vec<TrafficRecord>> {
        Ok(top_by_count(&self.records.read(), k))
    }

    fn count(&self) -> StoreResult<usize> {
        Ok(self.records.read().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::Arc;
    use std::thread;

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 1, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_save_rejects_duplicate() {
        let store = MemoryStore::new();
        store.save(TrafficRecord::new(at(1, 12, 0), 5)).unwrap();

        let err = store.save(TrafficRecord::new(at(1, 12, 0), 9)).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.find_all().unwrap()[0].car_count, 5);
    }

    #[test]
    fn test_save_batch_is_all_or_nothing() {
        let store = MemoryStore::new();
        store.save(TrafficRecord::new(at(1, 12, 30), 1)).unwrap();

        let batch = vec![
            TrafficRecord::new(at(1, 12, 0), 10),
            TrafficRecord::new(at(1, 12, 30), 20),
        ];
        assert!(store.save_batch(batch).is_err());
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_save_batch_rejects_duplicates_within_batch() {
        let store = MemoryStore::new();
        let batch = vec![
            TrafficRecord::new(at(1, 12, 0), 10),
            TrafficRecord::new(at(1, 12, 0), 20),
        ];
        assert!(matches!(
            store.save_batch(batch),
            Err(StoreError::Duplicate(_))
        ));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_range_is_half_open() {
        let store = MemoryStore::new();
        for (h, c) in [(10, 1), (11, 2), (12, 3)] {
            store.save(TrafficRecord::new(at(1, h, 0), c)).unwrap();
        }

        let found = store
            .find_by_timestamp_range(at(1, 10, 0), at(1, 12, 0))
            .unwrap();
        let counts: Vec<u32> = found.iter().map(|r| r.car_count).collect();
        assert_eq!(counts, vec![1, 2]);
    }

    #[test]
    fn test_ordered_by_timestamp() {
        let store = MemoryStore::new();
        store.save(TrafficRecord::new(at(2, 0, 0), 1)).unwrap();
        store.save(TrafficRecord::new(at(1, 0, 0), 2)).unwrap();

        let all = store.find_all_ordered_by_timestamp().unwrap();
        assert_eq!(all[0].timestamp, at(1, 0, 0));
        assert_eq!(all[1].timestamp, at(2, 0, 0));
    }

    #[test]
    fn test_top_by_count_ties_earliest_first() {
        let store = MemoryStore::new();
        store.save(TrafficRecord::new(at(1, 3, 0), 7)).unwrap();
        store.save(TrafficRecord::new(at(1, 1, 0), 7)).unwrap();
        store.save(TrafficRecord::new(at(1, 2, 0), 9)).unwrap();
        store.save(TrafficRecord::new(at(1, 4, 0), 1)).unwrap();

        let top = store.find_top_by_count(3).unwrap();
        let ts: Vec<NaiveDateTime> = top.iter().map(|r| r.timestamp).collect();
        assert_eq!(ts, vec![at(1, 2, 0), at(1, 1, 0), at(1, 3, 0)]);
    }

    #[test]
    fn test_concurrent_saves_on_one_timestamp() {
        let store = Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.save(TrafficRecord::new(at(1, 12, 0), i)))
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(
            results
                .iter()
                .filter_map(|r| r.as_ref().err())
                .all(|e| matches!(e, StoreError::Duplicate(_)))
        );
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_concurrent_overlapping_batches() {
        let store = Arc::new(MemoryStore::new());
        // every batch shares 00:00 and adds one slot of its own
        let handles: Vec<_> = (1..=8)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    store.save_batch(vec![
                        TrafficRecord::new(at(2, 0, 0), 1),
                        TrafficRecord::new(at(2, i, 0), i),
                    ])
                })
            })
            .collect();
        let committed = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|r| r.is_ok())
            .count();

        assert_eq!(committed, 1);
        assert_eq!(store.count().unwrap(), 2);
    }
}
