//! 时间工具函数: 分钟/周窗口换算
//!
//! repository 层只接收 `i64` Unix millis。

pub const MINUTE_MS: i64 = 60_000;
pub const WEEK_MS: i64 = 7 * 24 * 60 * MINUTE_MS;

/// Elapsed whole minutes between two millisecond timestamps, rounded to nearest
///
/// Negative spans (clock skew) clamp to 0.
pub fn elapsed_minutes(start_ms: i64, end_ms: i64) -> i64 {
    let span = (end_ms - start_ms).max(0);
    (span + MINUTE_MS / 2) / MINUTE_MS
}

/// Rolling 7-day windows ending at `now`, oldest first: `(start, end)` with `start <= t < end`
pub fn rolling_weeks(now: i64, weeks: usize) -> Vec<(i64, i64)> {
    let mut windows: Vec<(i64, i64)> = (0..weeks as i64)
        .map(|i| {
            let end = now - i * WEEK_MS;
            (end - WEEK_MS, end)
        })
        .collect();
    windows.reverse();
    windows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_minutes_rounds_to_nearest() {
        assert_eq!(elapsed_minutes(0, 40 * MINUTE_MS), 40);
        assert_eq!(elapsed_minutes(0, 40 * MINUTE_MS + 29_999), 40);
        assert_eq!(elapsed_minutes(0, 40 * MINUTE_MS + 30_000), 41);
        assert_eq!(elapsed_minutes(1_000, 0), 0);
    }

    #[test]
    fn test_rolling_weeks_are_contiguous_and_oldest_first() {
        let now = 100 * WEEK_MS;
        let weeks = rolling_weeks(now, 8);
        assert_eq!(weeks.len(), 8);
        assert_eq!(weeks.last(), Some(&(now - WEEK_MS, now)));
        assert_eq!(weeks[0].0, now - 8 * WEEK_MS);
        for pair in weeks.windows(2) {
            assert_eq!(pair[0].1, pair[1].0);
        }
    }
}
