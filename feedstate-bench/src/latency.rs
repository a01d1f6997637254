//! Latency measurement utilities.

use hdrhistogram::{CreationError, Histogram};
use std::time::{Duration, Instant};

/// Latency statistics.
#[derive(Debug, Clone)]
pub struct LatencyStats {
    /// Minimum latency.
    pub min: Duration,
    /// Maximum latency.
    pub max: Duration,
    /// Mean latency.
    pub mean: Duration,
    /// Median latency (p50).
    pub median: Duration,
    /// 99th percentile latency.
    pub p99: Duration,
    /// 99.9th percentile latency.
    pub p999: Duration,
    /// Sample count.
    pub count: u64,
}

/// Collects latency samples in nanoseconds into an HDR histogram.
pub struct LatencyCollector {
    histogram: Histogram<u64>,
}

impl LatencyCollector {
    /// Creates a collector tracking up to one minute at three significant
    /// digits.
    ///
    /// # Errors
    /// Returns an error if the histogram cannot be allocated.
    pub fn new() -> Result<Self, CreationError> {
        Self::with_max(Duration::from_secs(60))
    }

    /// Creates a collector tracking latencies up to `max`. Larger samples
    /// are clamped.
    ///
    /// # Errors
    /// Returns an error if `max` is below two nanoseconds.
    pub fn with_max(max: Duration) -> Result<Self, CreationError> {
        let high = u64::try_from(max.as_nanos()).unwrap_or(u64::MAX);
        Ok(Self {
            histogram: Histogram::new_with_bounds(1, high, 3)?,
        })
    }

    /// Records a latency sample.
    #[inline]
    pub fn record(&mut self, latency: Duration) {
        let nanos = u64::try_from(latency.as_nanos()).unwrap_or(u64::MAX);
        self.histogram.saturating_record(nanos.max(1));
    }

    /// Measures the latency of a function.
    pub fn measure<F, T>(&mut self, f: F) -> T
    where
        F: FnOnce() -> T,
    {
        let start = Instant::now();
        let result = f();
        self.record(start.elapsed());
        result
    }

    /// Computes statistics from collected samples.
    #[must_use]
    pub fn stats(&self) -> Option<LatencyStats> {
        if self.histogram.is_empty() {
            return None;
        }
        let h = &self.histogram;
        Some(LatencyStats {
            min: Duration::from_nanos(h.min()),
            max: Duration::from_nanos(h.max()),
            mean: Duration::from_nanos(h.mean() as u64),
            median: Duration::from_nanos(h.value_at_quantile(0.5)),
            p99: Duration::from_nanos(h.value_at_quantile(0.99)),
            p999: Duration::from_nanos(h.value_at_quantile(0.999)),
            count: h.len(),
        })
    }

    /// Clears all samples.
    pub fn clear(&mut self) {
        self.histogram.reset();
    }

    /// Returns the number of samples.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.histogram.len()
    }

    /// Returns true if no samples have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.histogram.is_empty()
    }
}
