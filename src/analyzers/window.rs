//! Ranking and fixed-length window search.

use crate::model::TrafficRecord;

/// Window length used by the least-busy-period report: three half-hour
/// samples, i.e. 1.5 hours of data.
pub const DEFAULT_WINDOW: usize = 3;

/// The `k` busiest records, highest count first, earliest timestamp first on
/// equal counts.
pub fn top_k(records: &[TrafficRecord], k: usize) -> Vec<TrafficRecord> {
    let mut ranked = records.to_vec();
    ranked.sort_by(TrafficRecord::busiest_first);
    ranked.truncate(k);
    ranked
}

/// Finds the contiguous run of `window_size` records with the smallest total.
///
/// `ordered` must be sorted ascending by timestamp. Windows are counted in
/// records, not wall-clock time. The earliest window wins a tie. With fewer
/// than `window_size` records the whole input is returned. A zero
/// `window_size` yields an empty result.
pub fn min_sum_window(ordered: &[TrafficRecord], window_size: usize) -> Vec<TrafficRecord> {
    if window_size == 0 {
        return Vec::new();
    }
    if ordered.len() < window_size {
        return ordered.to_vec();
    }

    let mut sum: u64 = ordered[..window_size]
        .iter()
        .map(|r| u64::from(r.car_count))
        .sum();
    let mut min_sum = sum;
    let mut min_start = 0;

    for start in 1..=ordered.len() - window_size {
        sum -= u64::from(ordered[start - 1].car_count);
        sum += u64::from(ordered[start + window_size - 1].car_count);
        if sum < min_sum {
            min_sum = sum;
            min_start = start;
        }
    }

    ordered[min_start..min_start + window_size].to_vec()
}
