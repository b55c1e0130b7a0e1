//! Pull-based "new issue" detection with callback fan-out.
//!
//! The backend only exposes a monotonically increasing `next id` counter. An
//! [`IssueWatcher`] polls it, diffs against the last value it saw and hands
//! every new id to each registered observer, once, in ascending order.

pub mod counters;
pub mod errors;
pub mod observer;
pub mod source;
pub mod watcher;

pub use counters::{CountersSnapshot, WatcherCounters};
pub use errors::WatcherError;
pub use observer::{Observer, ObserverFuture, ObserverToken, observer};
pub use source::SequenceSource;
pub use watcher::{IssueWatcher, TickOutcome, WatcherConfig};

/// Id handed out by the backend's sequence counter.
pub type SequenceId = u64;
