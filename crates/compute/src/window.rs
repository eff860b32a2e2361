//! Time-bounded sample buffer with mean / stdev and the low-wait predicate.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// How long samples are kept.
pub const DEFAULT_WINDOW_DAYS: i64 = 5;

/// One recorded wait time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub value: i64,
}

/// Rolling history of wait samples for one ride.
///
/// Samples are kept oldest-first. Every [`record`](Self::record) trims samples
/// older than `timestamp - window`, so statistics always cover exactly the
/// retained window.
#[derive(Debug, Clone)]
pub struct WindowedStatistic {
    samples: VecDeque<Sample>,
    window: Duration,
    current_value: Option<i64>,
}

impl Default for WindowedStatistic {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowedStatistic {
    /// Create an empty statistic with the default 5-day window.
    pub fn new() -> Self {
        Self::with_window(Duration::days(DEFAULT_WINDOW_DAYS))
    }

    /// Create an empty statistic with a custom window.
    pub fn with_window(window: Duration) -> Self {
        Self {
            samples: VecDeque::new(),
            window,
            current_value: None,
        }
    }

    /// Rebuild from persisted history. Samples are taken as-is, no trimming.
    pub fn from_history(history: impl IntoIterator<Item = Sample>, current_value: Option<i64>) -> Self {
        let mut stat = Self::new();
        stat.samples = history.into_iter().collect();
        stat.current_value = current_value;
        stat
    }

    /// Append a sample, make it the current value and trim the window.
    ///
    /// Trimming pops from the front only, so the cost is proportional to the
    /// number of samples dropped.
    pub fn record(&mut self, value: i64, timestamp: DateTime<Utc>) {
        self.samples.push_back(Sample { timestamp, value });
        self.current_value = Some(value);

        let cutoff = timestamp - self.window;
        while let Some(oldest) = self.samples.front() {
            if oldest.timestamp < cutoff {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Clear the current value. History is kept so a reopen is judged
    /// against pre-closure waits.
    pub fn mark_closed(&mut self) {
        self.current_value = None;
    }

    pub fn current_value(&self) -> Option<i64> {
        self.current_value
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Retained samples, oldest first.
    pub fn samples(&self) -> impl Iterator<Item = &Sample> + '_ {
        self.samples.iter()
    }

    /// Arithmetic mean of the retained samples, `None` when empty.
    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: f64 = self.samples.iter().map(|s| s.value as f64).sum();
        Some(sum / self.samples.len() as f64)
    }

    /// Sample standard deviation (divisor `n - 1`), `None` below two samples.
    pub fn stdev(&self) -> Option<f64> {
        let n = self.samples.len();
        if n < 2 {
            return None;
        }
        let mean = self.mean()?;
        let sum_sq: f64 = self
            .samples
            .iter()
            .map(|s| (s.value as f64 - mean).powi(2))
            .sum();
        Some((sum_sq / (n - 1) as f64).sqrt())
    }

    /// Whether `current` lies strictly more than one stdev below the mean.
    ///
    /// False when `current` is `None`, when mean or stdev are unavailable,
    /// or when the stdev is exactly zero.
    pub fn is_unusually_low(&self, current: Option<i64>) -> bool {
        let Some(current) = current else {
            return false;
        };
        let (Some(mean), Some(stdev)) = (self.mean(), self.stdev()) else {
            return false;
        };
        if stdev == 0.0 {
            return false;
        }
        (current as f64) < mean - stdev
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn empty_window_has_no_stats() {
        let stat = WindowedStatistic::new();
        assert_eq!(stat.mean(), None);
        assert_eq!(stat.stdev(), None);
        assert!(!stat.is_unusually_low(Some(0)));
    }

    #[test]
    fn single_sample_has_mean_but_no_stdev() {
        let mut stat = WindowedStatistic::new();
        stat.record(5, t0());
        assert_eq!(stat.mean(), Some(5.0));
        assert_eq!(stat.stdev(), None);
        assert_eq!(stat.current_value(), Some(5));
    }

    #[test]
    fn mean_and_sample_stdev() {
        let mut stat = WindowedStatistic::new();
        for (i, v) in [10, 11, 12, 13, 14].into_iter().enumerate() {
            stat.record(v, t0() + Duration::minutes(5 * i as i64));
        }
        assert_eq!(stat.mean(), Some(12.0));
        // sum of squares = 10, n - 1 = 4
        let stdev = stat.stdev().unwrap();
        assert!((stdev - 2.5_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn drop_to_one_is_unusually_low() {
        let mut stat = WindowedStatistic::new();
        for (i, v) in [10, 11, 12, 13, 14].into_iter().enumerate() {
            stat.record(v, t0() + Duration::minutes(5 * i as i64));
        }
        stat.record(1, t0() + Duration::minutes(30));
        assert!(stat.is_unusually_low(stat.current_value()));
    }

    #[test]
    fn threshold_is_strict_at_one_stdev() {
        // 8, 10, 12 -> mean 10, sample stdev 2
        let mut stat = WindowedStatistic::new();
        stat.record(8, t0());
        stat.record(10, t0() + Duration::minutes(5));
        stat.record(12, t0() + Duration::minutes(10));
        assert_eq!(stat.mean(), Some(10.0));
        assert_eq!(stat.stdev(), Some(2.0));

        assert!(stat.is_unusually_low(Some(7)));
        assert!(!stat.is_unusually_low(Some(8)));
        assert!(!stat.is_unusually_low(None));
    }

    #[test]
    fn zero_stdev_is_never_low() {
        let mut stat = WindowedStatistic::new();
        for i in 0..4 {
            stat.record(10, t0() + Duration::minutes(i));
        }
        assert_eq!(stat.stdev(), Some(0.0));
        assert!(!stat.is_unusually_low(Some(0)));
    }

    #[test]
    fn old_samples_are_trimmed_on_record() {
        let mut stat = WindowedStatistic::new();
        stat.record(10, t0() - Duration::days(6));
        stat.record(20, t0());
        assert_eq!(stat.len(), 1);
        assert_eq!(stat.mean(), Some(20.0));
    }

    #[test]
    fn sample_exactly_at_cutoff_is_kept() {
        let mut stat = WindowedStatistic::new();
        stat.record(10, t0() - Duration::days(5));
        stat.record(20, t0());
        assert_eq!(stat.len(), 2);
    }

    #[test]
    fn every_retained_sample_is_within_window_of_last_record() {
        let mut stat = WindowedStatistic::new();
        let mut ts = t0();
        for i in 0..200i64 {
            // Irregular steps between 1 and 17 hours.
            ts += Duration::hours(1 + (i * 7) % 17);
            stat.record(i, ts);
            let cutoff = ts - stat.window();
            assert!(stat.samples().all(|s| s.timestamp >= cutoff));
        }
        assert!(stat.len() < 200);
    }

    #[test]
    fn mark_closed_keeps_history() {
        let mut stat = WindowedStatistic::new();
        stat.record(10, t0());
        stat.record(20, t0() + Duration::minutes(5));
        stat.mark_closed();
        assert_eq!(stat.current_value(), None);
        assert_eq!(stat.len(), 2);
        assert_eq!(stat.mean(), Some(15.0));
    }

    #[test]
    fn custom_window_trims_sooner() {
        let mut stat = WindowedStatistic::with_window(Duration::hours(1));
        stat.record(1, t0());
        stat.record(2, t0() + Duration::minutes(30));
        stat.record(3, t0() + Duration::minutes(90));
        let kept: Vec<i64> = stat.samples().map(|s| s.value).collect();
        assert_eq!(kept, vec![2, 3]);
    }
}
