//! The query surface of the analytics core.
//!
//! [`TrafficAnalytics`] fetches from a [`RecordStore`] and hands the records to
//! the pure functions in [`crate::analyzers`]. Each call recomputes from the
//! full record set.

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use crate::analyzers::types::{DailyTotals, Forecast, HourlyDistribution, Statistics};
use crate::analyzers::window::DEFAULT_WINDOW;
use crate::analyzers::{aggregate, forecast, window};
use crate::error::{Result, TrafficError};
use crate::ingest;
use crate::model::TrafficRecord;
use crate::paging::{Page, PageRequest, paginate};
use crate::report::{StructuredReport, TrafficReport};
use crate::store::RecordStore;

pub struct TrafficAnalytics<S> {
    store: S,
}

impl<S: RecordStore> TrafficAnalytics<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validates and stores a single sample.
    ///
    /// # Errors
    ///
    /// [`TrafficError::InvalidInput`] for a missing timestamp or a negative
    /// count, [`TrafficError::DuplicateTimestamp`] if the instant is taken.
    #[tracing::instrument(skip(self))]
    pub fn add_record(
        &self,
        timestamp: Option<NaiveDateTime>,
        car_count: i64,
    ) -> Result<TrafficRecord> {
        let record = ingest::validate_record(timestamp, car_count)?;
        let saved = self.store.save(record)?;
        debug!(timestamp = %saved.timestamp, car_count = saved.car_count, "Record saved");
        Ok(saved)
    }

    /// Ingests newline-separated samples as one atomic batch.
    ///
    /// Returns the number of records committed. On any malformed line or
    /// duplicate timestamp nothing is stored.
    #[tracing::instrument(skip(self, text), fields(bytes = text.len()))]
    pub fn ingest_bulk(&self, text: &str) -> Result<usize> {
        let records = ingest::parse_bulk(text)?;
        let n = self.store.save_batch(records)?;
        info!(records = n, "Bulk ingestion committed");
        Ok(n)
    }

    /// Loads sample data when the store is empty; otherwise does nothing.
    ///
    /// Lines without exactly two fields are skipped.
    #[tracing::instrument(skip(self, text))]
    pub fn seed_if_empty(&self, text: &str) -> Result<usize> {
        let existing = self.store.count()?;
        if existing > 0 {
            debug!(existing, "Store already populated, skipping seed");
            return Ok(0);
        }

        let records = ingest::parse_bulk_lenient(text)?;
        let n = self.store.save_batch(records)?;
        info!(records = n, "Loaded sample traffic data");
        Ok(n)
    }

    pub fn total_count(&self) -> Result<u64> {
        let records = self.store.find_all()?;
        if records.is_empty() {
            info!("No traffic data found");
        }
        Ok(aggregate::total_count(&records))
    }

    pub fn daily_totals(&self) -> Result<DailyTotals> {
        Ok(aggregate::daily_totals(&self.store.find_all()?))
    }

    pub fn hourly_distribution(&self) -> Result<HourlyDistribution> {
        Ok(aggregate::hourly_distribution(&self.store.find_all()?))
    }

    /// Busiest hour of day and its total. `None` when there is no data.
    pub fn peak_hour(&self) -> Result<Option<(u32, u64)>> {
        Ok(aggregate::peak_hour(&self.hourly_distribution()?))
    }

    pub fn statistics(&self) -> Result<Statistics> {
        debug!("Generating traffic statistics");
        Ok(aggregate::statistics(&self.store.find_all()?))
    }

    /// The `k` records with the most cars, earliest first on ties.
    pub fn top_k(&self, k: usize) -> Result<Vec<TrafficRecord>> {
        let mut top = self.store.find_top_by_count(k)?;
        // tie order is part of the store contract, enforced here as well
        top.sort_by(TrafficRecord::busiest_first);
        Ok(top)
    }

    /// Least busy run of `window_size` consecutive records.
    pub fn min_sum_window(&self, window_size: usize) -> Result<Vec<TrafficRecord>> {
        if window_size == 0 {
            return Err(TrafficError::InvalidInput(
                "Window size must be greater than zero".into(),
            ));
        }
        let ordered = self.store.find_all_ordered_by_timestamp()?;
        Ok(window::min_sum_window(&ordered, window_size))
    }

    /// Forecasts traffic for `[start_time, end_time]` from the preceding 30
    /// days of samples.
    ///
    /// # Errors
    ///
    /// [`TrafficError::InsufficientHistory`] when the lookback window holds no
    /// samples; [`TrafficError::InvalidInput`] when `end_time < start_time`.
    #[tracing::instrument(skip(self))]
    pub fn predict(&self, start_time: NaiveDateTime, end_time: NaiveDateTime) -> Result<Forecast> {
        if end_time < start_time {
            return Err(TrafficError::InvalidInput(format!(
                "Forecast end {end_time} is before start {start_time}"
            )));
        }

        let from = forecast::lookback_start(start_time);
        let history = self.store.find_by_timestamp_range(from, start_time)?;

        match forecast::forecast_from_history(&history, start_time, end_time) {
            Some(f) => {
                info!(condition = %f.condition, samples = history.len(), "Forecast computed");
                Ok(f)
            }
            None => {
                warn!(%from, to = %start_time, "No history in lookback window");
                Err(TrafficError::InsufficientHistory {
                    from,
                    to: start_time,
                })
            }
        }
    }

    /// Collects everything the report views need from a single snapshot.
    pub fn report(&self) -> Result<TrafficReport> {
        let ordered = self.store.find_all_ordered_by_timestamp()?;
        Ok(TrafficReport {
            total_cars: aggregate::total_count(&ordered),
            daily_totals: aggregate::daily_totals(&ordered),
            top_records: window::top_k(&ordered, 3),
            least_busy: window::min_sum_window(&ordered, DEFAULT_WINDOW),
        })
    }

    pub fn text_report(&self) -> Result<String> {
        Ok(self.report()?.render_text())
    }

    pub fn structured_report(&self) -> Result<StructuredReport> {
        Ok(self.report()?.to_structured())
    }

    pub fn list_records(&self, req: PageRequest) -> Result<Page<TrafficRecord>> {
        debug!(page = req.page, size = req.size, "Listing records");
        paginate(self.store.find_all()?, req)
    }
}
