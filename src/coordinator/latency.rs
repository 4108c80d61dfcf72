//! Time from sending a player page request to holding the parsed record.

use std::sync::Mutex;
use std::time::Duration;

use hdrhistogram::Histogram;

/// Longest fetch tracked exactly (ten minutes, in microseconds).
const MAX_TRACKED_US: u64 = 600_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPercentiles {
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
}

/// Fetch times for one run, shared by every worker.
pub struct FetchLatency {
    histogram: Mutex<Histogram<u64>>,
}

impl FetchLatency {
    pub fn new() -> Self {
        let histogram = Histogram::new_with_bounds(1, MAX_TRACKED_US, 3).expect("valid histogram bounds");
        Self {
            histogram: Mutex::new(histogram),
        }
    }

    /// Sub-microsecond fetches count as 1us, anything over ten minutes as ten minutes.
    pub fn record(&self, fetch_time: Duration) {
        let us = u64::try_from(fetch_time.as_micros()).unwrap_or(MAX_TRACKED_US);
        if let Ok(mut h) = self.histogram.lock() {
            h.saturating_record(us.clamp(1, MAX_TRACKED_US));
        }
    }

    pub fn samples(&self) -> u64 {
        self.histogram.lock().map(|h| h.len()).unwrap_or(0)
    }

    /// None until the first successful fetch.
    pub fn summary(&self) -> Option<FetchPercentiles> {
        let h = self.histogram.lock().ok()?;
        if h.len() == 0 {
            return None;
        }
        Some(FetchPercentiles {
            p50_us: h.value_at_quantile(0.50),
            p95_us: h.value_at_quantile(0.95),
            p99_us: h.value_at_quantile(0.99),
        })
    }
}

impl Default for FetchLatency {
    fn default() -> Self {
        Self::new()
    }
}
