//! Data types produced by the analyzers.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Per-date car totals, ascending by date.
pub type DailyTotals = BTreeMap<NaiveDate, u64>;

/// Per-hour-of-day (0–23) car totals across all dates. Only hours that have
/// at least one sample are present.
pub type HourlyDistribution = BTreeMap<u32, u64>;

/// Summary statistics over the whole record set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_cars: u64,
    pub average_cars_per_day: f64,
    pub total_records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_hour: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cars_in_peak_hour: Option<u64>,
}

impl Statistics {
    /// Peak hour rendered as an hour range, e.g. `"08:00 - 08:59"`.
    pub fn peak_hour_label(&self) -> Option<String> {
        self.peak_hour.map(|h| format!("{h:02}:00 - {h:02}:59"))
    }
}

/// Heuristic traffic band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrafficCondition {
    Low,
    Moderate,
    High,
}

impl TrafficCondition {
    /// Fixed confidence score attached to each band.
    pub fn confidence(self) -> f64 {
        match self {
            TrafficCondition::Low => 0.85,
            TrafficCondition::Moderate => 0.75,
            TrafficCondition::High => 0.80,
        }
    }
}

impl fmt::Display for TrafficCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrafficCondition::Low => "LOW",
            TrafficCondition::Moderate => "MODERATE",
            TrafficCondition::High => "HIGH",
        };
        f.write_str(s)
    }
}

/// On-demand traffic forecast for a time window. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub condition: TrafficCondition,
    pub confidence: f64,
    pub average_speed: f64,
    pub expected_volume: u32,
    pub expected_travel_time_minutes: u32,
    pub details: String,
    /// Reserved for a richer model; always `None` here.
    pub potential_incidents: Option<String>,
    /// Reserved for a richer model; always `None` here.
    pub alternative_routes: Option<String>,
}

impl Forecast {
    pub fn new(
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
        condition: TrafficCondition,
        average_speed: f64,
        expected_volume: u32,
        expected_travel_time_minutes: u32,
        details: String,
    ) -> Self {
        Self {
            start_time,
            end_time,
            condition,
            confidence: condition.confidence(),
            average_speed,
            expected_volume,
            expected_travel_time_minutes,
            details,
            potential_incidents: None,
            alternative_routes: None,
        }
    }
}
