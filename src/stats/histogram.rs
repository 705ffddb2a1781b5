//! Latency histogram using HdrHistogram
//!
//! Every worker records the wall time of each primitive call into its own
//! histogram; the pool merges them when the workers are joined.
//!
//! # Example
//!
//! ```
//! use fsdrill::stats::histogram::LatencyHistogram;
//! use std::time::Duration;
//!
//! let mut hist = LatencyHistogram::new();
//! hist.record(Duration::from_micros(100));
//! hist.record(Duration::from_micros(300));
//!
//! assert_eq!(hist.len(), 2);
//! assert!(hist.percentile(99.0).is_some());
//! ```

use crate::Result;
use hdrhistogram::Histogram;
use std::time::Duration;

/// Highest trackable latency: one hour, in nanoseconds
const MAX_LATENCY_NS: u64 = 3_600_000_000_000;

/// Latency histogram wrapper
///
/// Tracks 1ns to 1 hour at 3 significant digits. A primitive on a large file
/// can take seconds, so the range is wide on purpose; values outside it are
/// clamped.
#[derive(Debug, Clone)]
pub struct LatencyHistogram {
    histogram: Histogram<u64>,
}

impl LatencyHistogram {
    pub fn new() -> Self {
        let histogram = Histogram::new_with_bounds(1, MAX_LATENCY_NS, 3)
            .expect("histogram bounds are constant and valid");

        Self { histogram }
    }

    #[inline]
    pub fn record(&mut self, latency: Duration) {
        let nanos = u64::try_from(latency.as_nanos()).unwrap_or(u64::MAX);
        let _ = self.histogram.record(nanos.clamp(1, MAX_LATENCY_NS));
    }

    /// Apply `read` to the histogram, `None` when nothing was recorded
    fn read_ns(&self, read: impl FnOnce(&Histogram<u64>) -> u64) -> Option<Duration> {
        (!self.is_empty()).then(|| Duration::from_nanos(read(&self.histogram)))
    }

    /// Latency at `percentile` (0.0 - 100.0)
    pub fn percentile(&self, percentile: f64) -> Option<Duration> {
        self.read_ns(|h| h.value_at_percentile(percentile))
    }

    pub fn min(&self) -> Option<Duration> {
        self.read_ns(|h| h.min())
    }

    pub fn max(&self) -> Option<Duration> {
        self.read_ns(|h| h.max())
    }

    pub fn mean(&self) -> Option<Duration> {
        self.read_ns(|h| h.mean() as u64)
    }

    /// Number of samples recorded
    pub fn len(&self) -> u64 {
        self.histogram.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histogram.len() == 0
    }

    /// Merge another histogram into this one
    ///
    /// # Errors
    ///
    /// Returns an error if the histograms have incompatible bounds.
    pub fn merge(&mut self, other: &LatencyHistogram) -> Result<()> {
        self.histogram
            .add(&other.histogram)
            .map_err(|e| anyhow::anyhow!("Failed to merge histograms: {}", e))?;
        Ok(())
    }
}

impl Default for LatencyHistogram {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sweep_latencies() -> LatencyHistogram {
        // 1ms..=100ms in 1ms steps
        let mut hist = LatencyHistogram::new();
        for ms in 1..=100 {
            hist.record(Duration::from_millis(ms));
        }
        hist
    }

    fn within(actual: Duration, expected: Duration) -> bool {
        let tolerance = expected.as_nanos() / 100;
        actual.as_nanos().abs_diff(expected.as_nanos()) <= tolerance
    }

    #[test]
    fn test_nothing_recorded() {
        let hist = LatencyHistogram::default();
        assert!(hist.is_empty());
        assert_eq!(hist.len(), 0);
        assert!(hist.min().is_none());
        assert!(hist.max().is_none());
        assert!(hist.percentile(99.0).is_none());
    }

    #[test]
    fn test_sweep_percentiles() {
        let hist = sweep_latencies();
        assert_eq!(hist.len(), 100);
        assert!(within(hist.percentile(50.0).unwrap(), Duration::from_millis(50)));
        assert!(within(hist.percentile(90.0).unwrap(), Duration::from_millis(90)));
        assert!(within(hist.min().unwrap(), Duration::from_millis(1)));
        assert!(within(hist.max().unwrap(), Duration::from_millis(100)));
    }

    #[test]
    fn test_merge_keeps_extremes() {
        let mut fast = LatencyHistogram::new();
        fast.record(Duration::from_micros(20));

        let mut slow = sweep_latencies();
        slow.merge(&fast).unwrap();

        assert_eq!(slow.len(), 101);
        assert!(within(slow.min().unwrap(), Duration::from_micros(20)));
        assert!(within(slow.max().unwrap(), Duration::from_millis(100)));
    }

    #[test]
    fn test_clamps_out_of_range() {
        let mut hist = LatencyHistogram::new();
        hist.record(Duration::ZERO);
        hist.record(Duration::from_secs(2 * 3600));

        assert_eq!(hist.len(), 2);
        assert!(hist.max().unwrap() <= Duration::from_secs(3601));
    }
}
