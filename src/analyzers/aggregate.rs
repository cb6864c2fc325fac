//! Totals and calendar/hour-of-day grouping.

use chrono::Timelike;

use crate::analyzers::types::{DailyTotals, HourlyDistribution, Statistics};
use crate::analyzers::utility::mean_count;
use crate::model::TrafficRecord;

/// Sum of car counts over all records; 0 for an empty slice.
pub fn total_count(records: &[TrafficRecord]) -> u64 {
    records.iter().map(|r| u64::from(r.car_count)).sum()
}

/// Groups records by the date component of their timestamp (no zone shift).
pub fn daily_totals(records: &[TrafficRecord]) -> DailyTotals {
    let mut totals = DailyTotals::new();
    for r in records {
        *totals.entry(r.timestamp.date()).or_default() += u64::from(r.car_count);
    }
    totals
}

/// Groups records by hour of day across every date.
pub fn hourly_distribution(records: &[TrafficRecord]) -> HourlyDistribution {
    let mut hours = HourlyDistribution::new();
    for r in records {
        *hours.entry(r.timestamp.hour()).or_default() += u64::from(r.car_count);
    }
    hours
}

/// Hour with the largest total. The lowest hour wins a tie.
pub fn peak_hour(distribution: &HourlyDistribution) -> Option<(u32, u64)> {
    let mut peak: Option<(u32, u64)> = None;
    // ascending key order, so only a strictly larger total can replace the peak
    for (&hour, &cars) in distribution {
        match peak {
            Some((_, best)) if cars <= best => {}
            _ => peak = Some((hour, cars)),
        }
    }
    peak
}

/// Computes [`Statistics`]. The per-day average is taken over daily sums,
/// not over raw samples.
pub fn statistics(records: &[TrafficRecord]) -> Statistics {
    let daily = daily_totals(records);
    let peak = peak_hour(&hourly_distribution(records));

    Statistics {
        total_cars: total_count(records),
        average_cars_per_day: mean_count(daily.values().copied()),
        total_records: records.len(),
        peak_hour: peak.map(|(h, _)| h),
        cars_in_peak_hour: peak.map(|(_, c)| c),
    }
}
