//! Issue watcher
//!
//! Polls a [`SequenceSource`] on a fixed interval and fans every newly
//! appeared id out to the registered observers.
//!
//! Guarantees:
//! - Ticks never overlap: a tick that starts while another is running is
//!   skipped, so an id range is never dispatched twice.
//! - Ids are dispatched in ascending order; for each id observers run one at a
//!   time in registration order.
//! - The observer set is snapshotted when a tick starts. A call begins when
//!   the observer is found still registered and marked in flight, both under
//!   the registry lock; once `unregister` returns no new call can begin.
//! - `last_known_id` only advances after the full range has been dispatched.
//!
//! State is in-memory only: if the process dies mid-dispatch the remaining
//! ids of that tick are lost with it.

use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use common::logger::{TraceId, observer_span, run_timed, tick_span};
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{Instrument, Span, debug, error, field, info, warn};

use crate::SequenceId;
use crate::counters::WatcherCounters;
use crate::errors::WatcherError;
use crate::observer::{Observer, ObserverToken, observer};
use crate::source::SequenceSource;

#[derive(Clone, Debug)]
pub struct WatcherConfig {
    /// Interval used by `tick` bookkeeping until `start` supplies one. Must be
    /// non-zero; a zero value falls back to the default.
    pub poll_interval: Duration,

    /// Upper bound on a single observer call. `None` means ten poll intervals.
    pub observer_timeout: Option<Duration>,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            observer_timeout: None,
        }
    }
}

/// What a single tick did.
#[derive(Debug)]
pub enum TickOutcome {
    /// Another tick was still running; nothing was fetched.
    Busy,
    /// The backend could not be reached; state is unchanged.
    FetchFailed(WatcherError),
    /// First successful fetch: the baseline was recorded, nothing dispatched.
    Baselined(SequenceId),
    /// Counter did not advance (or moved backwards).
    Idle,
    /// Ids in `[from, to)` were dispatched.
    Dispatched { from: SequenceId, to: SequenceId },
}

struct Runner {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct Registry {
    observers: BTreeMap<ObserverToken, Observer>,
    /// Observer whose call has begun and not yet returned.
    in_flight: Option<ObserverToken>,
}

struct Inner<S> {
    source: S,
    registry: Mutex<Registry>,
    next_token: AtomicU64,
    last_known: Mutex<Option<SequenceId>>,
    busy: AtomicBool,
    poll_interval: Mutex<Duration>,
    observer_timeout: Option<Duration>,
    counters: WatcherCounters,
}

pub struct IssueWatcher<S: SequenceSource> {
    inner: Arc<Inner<S>>,
    runner: Mutex<Option<Runner>>,
}

impl<S: SequenceSource> IssueWatcher<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(source, WatcherConfig::default())
    }

    pub fn with_config(source: S, config: WatcherConfig) -> Self {
        let poll_interval = if config.poll_interval.is_zero() {
            let fallback = WatcherConfig::default().poll_interval;
            warn!(
                fallback_ms = fallback.as_millis() as u64,
                "zero poll interval configured; using default"
            );
            fallback
        } else {
            config.poll_interval
        };

        Self {
            inner: Arc::new(Inner {
                source,
                registry: Mutex::new(Registry::default()),
                next_token: AtomicU64::new(1),
                last_known: Mutex::new(None),
                busy: AtomicBool::new(false),
                poll_interval: Mutex::new(poll_interval),
                observer_timeout: config.observer_timeout,
                counters: WatcherCounters::default(),
            }),
            runner: Mutex::new(None),
        }
    }

    /// Starts polling every `poll_every`. Must be called inside a Tokio runtime.
    ///
    /// Calling `start` while the watcher is already running is a no-op. A zero
    /// interval, or a zero observer timeout, is rejected and nothing is spawned.
    pub fn start(&self, poll_every: Duration) -> Result<(), WatcherError> {
        if poll_every.is_zero() {
            return Err(WatcherError::InvalidConfig("poll interval must be non-zero"));
        }
        if self.inner.observer_timeout.is_some_and(|t| t.is_zero()) {
            return Err(WatcherError::InvalidConfig(
                "observer timeout must be non-zero",
            ));
        }

        let mut runner = self.runner.lock();

        if let Some(r) = runner.as_ref() {
            if !r.handle.is_finished() {
                debug!("issue watcher already running; start ignored");
                return Ok(());
            }
        }

        *self.inner.poll_interval.lock() = poll_every;

        let (shutdown, shutdown_rx) = watch::channel(false);
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(run_poller(inner, poll_every, shutdown_rx));

        *runner = Some(Runner { shutdown, handle });
        Ok(())
    }

    /// Stops scheduling ticks. A tick already in progress runs to completion.
    pub fn stop(&self) {
        if let Some(r) = self.runner.lock().take() {
            // The poller may already have exited; nothing to signal then.
            let _ = r.shutdown.send(true);
            debug!("issue watcher stop requested");
        }
    }

    pub fn is_running(&self) -> bool {
        self.runner
            .lock()
            .as_ref()
            .is_some_and(|r| !r.handle.is_finished())
    }

    /// Stops polling, drops every observer and forgets the baseline.
    pub fn shutdown(&self) {
        self.stop();

        let removed = {
            let mut registry = self.inner.registry.lock();
            let n = registry.observers.len();
            registry.observers.clear();
            n
        };
        *self.inner.last_known.lock() = None;

        info!(removed, "issue watcher shut down");
    }

    /// Registers an async callback; it sees ids from ticks that start after this call.
    pub fn register<F, Fut>(&self, f: F) -> ObserverToken
    where
        F: Fn(SequenceId) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.register_observer(observer(f))
    }

    pub fn register_observer(&self, obs: Observer) -> ObserverToken {
        let token = ObserverToken(self.inner.next_token.fetch_add(1, Ordering::Relaxed));
        let count = {
            let mut registry = self.inner.registry.lock();
            registry.observers.insert(token, obs);
            registry.observers.len()
        };

        debug!(%token, observers = count, "observer registered");
        token
    }

    /// Removes an observer. Returns `false` if the token was unknown.
    ///
    /// A call already in flight runs to completion; no later call begins.
    pub fn unregister(&self, token: ObserverToken) -> bool {
        let (removed, in_flight) = {
            let mut registry = self.inner.registry.lock();
            let removed = registry.observers.remove(&token).is_some();
            (removed, registry.in_flight == Some(token))
        };
        if removed {
            debug!(%token, in_flight, "observer unregistered");
        }
        removed
    }

    /// Whether a call of this observer has begun and not yet returned.
    pub fn is_in_flight(&self, token: ObserverToken) -> bool {
        self.inner.registry.lock().in_flight == Some(token)
    }

    /// Runs one fetch + dispatch cycle now.
    pub async fn tick(&self) -> TickOutcome {
        self.inner.tick().await
    }

    pub fn last_known_id(&self) -> Option<SequenceId> {
        *self.inner.last_known.lock()
    }

    pub fn observer_count(&self) -> usize {
        self.inner.registry.lock().observers.len()
    }

    pub fn counters(&self) -> &WatcherCounters {
        &self.inner.counters
    }

    pub fn source(&self) -> &S {
        &self.inner.source
    }
}

async fn run_poller<S: SequenceSource>(
    inner: Arc<Inner<S>>,
    poll_every: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = interval(poll_every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(every_ms = poll_every.as_millis() as u64, "issue watcher started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            // Also fires when the sender is dropped with the watcher.
            _ = shutdown.changed() => break,
        }

        if *shutdown.borrow() {
            break;
        }

        inner.tick().await;
    }

    info!("issue watcher stopped");
}

/// Clears the busy flag when the tick ends, including on panic.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Clears the in-flight mark when the observer call returns or is dropped.
struct InFlight<'a>(&'a Mutex<Registry>);

impl<'a> InFlight<'a> {
    /// Marks `token` in flight if it is still registered.
    fn begin(registry: &'a Mutex<Registry>, token: ObserverToken) -> Option<Self> {
        let mut reg = registry.lock();
        if !reg.observers.contains_key(&token) {
            return None;
        }
        reg.in_flight = Some(token);
        Some(Self(registry))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.lock().in_flight = None;
    }
}

impl<S: SequenceSource> Inner<S> {
    async fn tick(&self) -> TickOutcome {
        let Some(_guard) = BusyGuard::acquire(&self.busy) else {
            WatcherCounters::incr(&self.counters.busy_skips);
            debug!("previous tick still running; skipping");
            return TickOutcome::Busy;
        };

        WatcherCounters::incr(&self.counters.ticks);

        let trace_id = TraceId::new();
        let span = tick_span(&trace_id);
        self.run_tick().instrument(span).await
    }

    async fn run_tick(&self) -> TickOutcome {
        let current = match self.source.fetch_next_sequence_id().await {
            Ok(id) => id,
            Err(e) => {
                let err = WatcherError::Fetch(e);
                WatcherCounters::incr(&self.counters.fetch_failures);
                warn!(error = %err, "tick skipped");
                return TickOutcome::FetchFailed(err);
            }
        };

        let last_known = *self.last_known.lock();

        let Some(from) = last_known else {
            *self.last_known.lock() = Some(current);
            info!(baseline = current, "sequence baseline established");
            return TickOutcome::Baselined(current);
        };

        if current <= from {
            if current < from {
                warn!(
                    last_known = from,
                    current, "sequence counter moved backwards; ignoring"
                );
            }
            return TickOutcome::Idle;
        }

        let span = Span::current();
        span.record("from_id", field::display(from));
        span.record("to_id", field::display(current));

        let snapshot: Vec<(ObserverToken, Observer)> = self
            .registry
            .lock()
            .observers
            .iter()
            .map(|(token, obs)| (*token, Arc::clone(obs)))
            .collect();

        info!(
            new_items = current - from,
            observers = snapshot.len(),
            "new items detected"
        );

        for id in from..current {
            for (token, obs) in &snapshot {
                let Some(_in_flight) = InFlight::begin(&self.registry, *token) else {
                    continue;
                };
                self.invoke(*token, obs, id).await;
            }
            WatcherCounters::incr(&self.counters.ids_dispatched);
        }

        *self.last_known.lock() = Some(current);

        TickOutcome::Dispatched { from, to: current }
    }

    fn observer_timeout(&self) -> Duration {
        self.observer_timeout
            .unwrap_or_else(|| *self.poll_interval.lock() * 10)
    }

    async fn invoke(&self, token: ObserverToken, obs: &Observer, id: SequenceId) {
        WatcherCounters::incr(&self.counters.observer_calls);

        let timeout = self.observer_timeout();
        let slow_after = *self.poll_interval.lock();

        let obs = Arc::clone(obs);
        let call = AssertUnwindSafe(async move { obs(id).await }).catch_unwind();

        let result = run_timed(
            observer_span(token, id),
            slow_after,
            tokio::time::timeout(timeout, call),
        )
        .await;

        let err = match result {
            Ok(Ok(Ok(()))) => {
                debug!(%token, id, "observer completed");
                return;
            }
            Ok(Ok(Err(source))) => WatcherError::ObserverFailed { token, id, source },
            Ok(Err(_panic)) => WatcherError::ObserverPanicked { token, id },
            Err(_elapsed) => WatcherError::ObserverTimedOut { token, id, timeout },
        };

        match err {
            WatcherError::ObserverTimedOut { .. } => {
                WatcherCounters::incr(&self.counters.observer_timeouts);
                warn!(error = %err, "observer call abandoned");
            }
            WatcherError::ObserverPanicked { .. } => {
                WatcherCounters::incr(&self.counters.observer_failures);
                error!(error = %err, "observer panicked");
            }
            _ => {
                WatcherCounters::incr(&self.counters.observer_failures);
                warn!(error = %err, "observer failed");
            }
        }
    }
}
