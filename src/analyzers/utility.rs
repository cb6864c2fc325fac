/// Arithmetic mean of integer counts, summed in `u64` before the single
/// division. Returns 0.0 for empty input.
pub fn mean_count<I>(counts: I) -> f64
where
    I: IntoIterator<Item = u64>,
{
    let (sum, n) = counts
        .into_iter()
        .fold((0u64, 0usize), |(s, n), c| (s + c, n + 1));
    if n == 0 { 0.0 } else { sum as f64 / n as f64 }
}
