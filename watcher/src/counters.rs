use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Minimal counters for operational visibility. Cloning shares the cells.
#[derive(Clone, Default, Debug)]
pub struct WatcherCounters {
    pub ticks: Arc<AtomicU64>,
    pub busy_skips: Arc<AtomicU64>,
    pub fetch_failures: Arc<AtomicU64>,

    pub ids_dispatched: Arc<AtomicU64>,
    pub observer_calls: Arc<AtomicU64>,
    pub observer_failures: Arc<AtomicU64>,
    pub observer_timeouts: Arc<AtomicU64>,
}

#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct CountersSnapshot {
    pub ticks: u64,
    pub busy_skips: u64,
    pub fetch_failures: u64,
    pub ids_dispatched: u64,
    pub observer_calls: u64,
    pub observer_failures: u64,
    pub observer_timeouts: u64,
}

impl WatcherCounters {
    pub(crate) fn incr(cell: &AtomicU64) {
        cell.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CountersSnapshot {
        CountersSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            busy_skips: self.busy_skips.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            ids_dispatched: self.ids_dispatched.load(Ordering::Relaxed),
            observer_calls: self.observer_calls.load(Ordering::Relaxed),
            observer_failures: self.observer_failures.load(Ordering::Relaxed),
            observer_timeouts: self.observer_timeouts.load(Ordering::Relaxed),
        }
    }
}
