//! Threshold-based traffic forecast.
//!
//! The forecast is plain arithmetic over the mean car count of the lookback
//! window; there is no learned model. Integer outputs are truncated, never
//! rounded.

use chrono::{Duration, NaiveDateTime};

use crate::analyzers::types::{Forecast, TrafficCondition};
use crate::analyzers::utility::mean_count;
use crate::model::TrafficRecord;

/// How far back [`forecast_from_history`]'s input is expected to reach.
pub const LOOKBACK_DAYS: i64 = 30;

const BASE_SPEED_KMH: f64 = 60.0;
const MIN_SPEED_KMH: f64 = 10.0;
const BASE_TRAVEL_MINUTES: f64 = 15.0;

/// Start of the history window for a forecast starting at `start`, clamped
/// to the earliest representable instant.
pub fn lookback_start(start: NaiveDateTime) -> NaiveDateTime {
    start
        .checked_sub_signed(Duration::days(LOOKBACK_DAYS))
        .unwrap_or(NaiveDateTime::MIN)
}

/// Maps a mean car count onto a traffic band.
///
/// | Mean        | Band     |
/// |-------------|----------|
/// | < 10        | LOW      |
/// | 10 ..< 30   | MODERATE |
/// | >= 30       | HIGH     |
pub fn classify(avg: f64) -> TrafficCondition {
    match avg {
        a if a < 10.0 => TrafficCondition::Low,
        a if a < 30.0 => TrafficCondition::Moderate,
        _ => TrafficCondition::High,
    }
}

pub fn average_speed(avg: f64) -> f64 {
    (BASE_SPEED_KMH - avg * 0.5).max(MIN_SPEED_KMH)
}

pub fn expected_volume(avg: f64) -> u32 {
    (avg * 0.8) as u32
}

pub fn expected_travel_time_minutes(avg: f64) -> u32 {
    let congestion = 1.0 + avg / 50.0;
    (BASE_TRAVEL_MINUTES * congestion) as u32
}

/// Builds a forecast from the records of the lookback window.
///
/// Returns `None` when `history` is empty; callers decide how to report that.
pub fn forecast_from_history(
    history: &[TrafficRecord],
    start_time: NaiveDateTime,
    end_time: NaiveDateTime,
) -> Option<Forecast> {
    if history.is_empty() {
        return None;
    }

    let avg = mean_count(history.iter().map(|r| u64::from(r.car_count)));

    Some(Forecast::new(
        start_time,
        end_time,
        classify(avg),
        average_speed(avg),
        expected_volume(avg),
        expected_travel_time_minutes(avg),
        format!(
            "Prediction based on {} historical data points",
            history.len()
        ),
    ))
}
