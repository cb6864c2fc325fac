//! Text and structured renderings of the traffic report.
//!
//! Both views are built from one [`TrafficReport`] so they always agree.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::analyzers::types::DailyTotals;
use crate::model::{TrafficRecord, format_timestamp};

/// Raw inputs of a report.
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficReport {
    pub total_cars: u64,
    pub daily_totals: DailyTotals,
    /// Busiest records, in ranking order.
    pub top_records: Vec<TrafficRecord>,
    /// Least busy window, ascending by timestamp.
    pub least_busy: Vec<TrafficRecord>,
}

/// One `{timestamp, carCount}` entry of the structured report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry {
    pub timestamp: String,
    pub car_count: u32,
}

impl From<&TrafficRecord> for ReportEntry {
    fn from(r: &TrafficRecord) -> Self {
        Self {
            timestamp: format_timestamp(&r.timestamp),
            car_count: r.car_count,
        }
    }
}

/// Structured report. Field names and order are an external contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredReport {
    pub total_cars: u64,
    pub daily_counts: BTreeMap<String, u64>,
    pub top_three_half_hours: Vec<ReportEntry>,
    pub least_cars_period: Vec<ReportEntry>,
}

impl TrafficReport {
    pub fn render_text(&self) -> String {
        let mut out = format!("Total cars seen: {}\n\n", self.total_cars);

        out.push_str("Daily car counts:\n");
        for (date, count) in &self.daily_totals {
            out.push_str(&format!("{} {}\n", date.format("%Y-%m-%d"), count));
        }

        out.push_str("\nTop 3 half hours with most cars:\n");
        push_records(&mut out, &self.top_records);

        out.push_str("\n1.5 hour period with least cars (3 contiguous half-hour records):\n");
        push_records(&mut out, &self.least_busy);

        out
    }

    pub fn to_structured(&self) -> StructuredReport {
        StructuredReport {
            total_cars: self.total_cars,
            daily_counts: self
                .daily_totals
                .iter()
                .map(|(d, c)| (d.format("%Y-%m-%d").to_string(), *c))
                .collect(),
            top_three_half_hours: self.top_records.iter().map(ReportEntry::from).collect(),
            least_cars_period: self.least_busy.iter().map(ReportEntry::from).collect(),
        }
    }
}

fn push_records(out: &mut String, records: &[TrafficRecord]) {
    for r in records {
        out.push_str(&format!("{} {}\n", format_timestamp(&r.timestamp), r.car_count));
    }
}
