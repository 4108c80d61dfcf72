//! Live counters for a scrape run. Updated by workers, read by the
//! progress logger and the final summary.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct RunProgress {
    pub total: AtomicU64,
    pub in_flight: AtomicU64,
    pub succeeded: AtomicU64,
    pub failed: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub total: u64,
    pub in_flight: u64,
    pub succeeded: u64,
    pub failed: u64,
}

impl ProgressSnapshot {
    pub fn done(&self) -> u64 {
        self.succeeded + self.failed
    }
}

impl RunProgress {
    pub fn new(total: usize) -> Self {
        let p = Self::default();
        p.total.store(total as u64, Ordering::Relaxed);
        p
    }

    pub fn start(&self) {
        self.in_flight.fetch_add(1, Ordering::Relaxed);
    }

    pub fn finish(&self, success: bool) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
        if success {
            self.succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            total: self.total.load(Ordering::Relaxed),
            in_flight: self.in_flight.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_finish_moves_counts() {
        let p = RunProgress::new(3);
        p.start();
        p.start();
        assert_eq!(p.snapshot().in_flight, 2);
        p.finish(true);
        p.finish(false);
        let s = p.snapshot();
        assert_eq!((s.in_flight, s.succeeded, s.failed, s.done()), (0, 1, 1, 2));
    }
}
