use chrono::NaiveDateTime;
use csv::WriterBuilder;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use super::{RecordStore, StoreError, StoreResult, check_batch, range, top_by_count};
use crate::model::TrafficRecord;

/// Append-only CSV file store.
///
/// The whole file is replayed into an in-memory index on open; each commit
/// appends its rows to the file before the index is updated, all under the
/// write lock.
#[derive(Debug)]
pub struct CsvStore {
    path: PathBuf,
    records: RwLock<BTreeMap<NaiveDateTime, TrafficRecord>>,
}

impl CsvStore {
    /// Opens (or creates) the store backed by `path`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut records = BTreeMap::new();
        if path.exists() {
            let file = File::open(&path)?;
            let mut rdr = csv::Reader::from_reader(file);

            for result in rdr.deserialize() {
                let record: TrafficRecord = result?;
                if records.insert(record.timestamp, record.clone()).is_some() {
                    return Err(StoreError::Corrupt(format!(
                        "duplicate timestamp {} in {}",
                        record.timestamp,
                        path.display()
                    )));
                }
            }
        }

        info!(path = %path.display(), records = records.len(), "CSV store opened");

        Ok(Self {
            path,
            records: RwLock::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends rows to the backing file, writing the header only when the
    /// file is new or empty. A failed write is truncated away.
    fn append_rows(&self, rows: &[TrafficRecord]) -> StoreResult<()> {
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;
        let needs_header = file.metadata()?.len() == 0;

        let mut writer = WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(Vec::new());
        for row in rows {
            writer.serialize(row)?;
        }
        let buf = writer.into_inner().map_err(|e| e.into_error())?;

        append_or_rollback(&mut file, &buf)?;

        debug!(path = %self.path.display(), rows = rows.len(), needs_header, "Appended CSV rows");
        Ok(())
    }
}

/// A sink that can be cut back to an earlier length.
trait Truncate: Write {
    fn current_len(&self) -> io::Result<u64>;
    fn truncate_to(&mut self, len: u64) -> io::Result<()>;
}

impl Truncate for File {
    fn current_len(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

/// Writes `buf` in full or restores the sink's previous length.
fn append_or_rollback<W: Truncate>(sink: &mut W, buf: &[u8]) -> io::Result<()> {
    let original_len = sink.current_len()?;
    if let Err(e) = sink.write_all(buf).and_then(|()| sink.flush()) {
        warn!(error = %e, original_len, "Append failed, truncating partial rows");
        if let Err(te) = sink.truncate_to(original_len) {
            error!(error = %te, "Failed to truncate partial rows");
        }
        return Err(e);
    }
    Ok(())
}

impl RecordStore for CsvStore {
    fn save(&self, record: TrafficRecord) -> StoreResult<TrafficRecord> {
        let mut records = self.records.write();
        if records.contains_key(&record.timestamp) {
            return Err(StoreError::Duplicate(record.timestamp));
        }

        self.append_rows(std::slice::from_ref(&record))?;
        records.insert(record.timestamp, record.clone());
        Ok(record)
    }

    fn save_batch(&self, batch: Vec<TrafficRecord>) -> StoreResult<usize> {
        let mut records = self.records.write();
        check_batch(&records, &batch)?;

        if batch.is_empty() {
            return Ok(0);
        }

        self.append_rows(&batch)?;
        let n = batch.len();
        for r in batch {
            records.insert(r.timestamp, r);
        }
        Ok(n)
    }

    fn find_all(&self) -> StoreResult<Vec<TrafficRecord>> {
        Ok(self.records.read().values().cloned().collect())
    }

    fn find_all_ordered_by_timestamp(&self) -> StoreResult<Vec<TrafficRecord>> {
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
