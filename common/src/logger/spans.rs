use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{Instrument, Span, field};

use super::TraceId;

/// Root span for one watcher tick. `from_id` / `to_id` are recorded once the
/// dispatch range is known.
pub fn tick_span(trace_id: &TraceId) -> Span {
    tracing::info_span!(
        "tick",
        trace_id = %trace_id,
        from_id = field::Empty,
        to_id = field::Empty
    )
}

/// Span for a single observer call on one id. `elapsed_ms` is filled in by
/// [`run_timed`].
pub fn observer_span(token: impl Display, id: u64) -> Span {
    tracing::debug_span!(
        "observer",
        token = %token,
        id,
        elapsed_ms = field::Empty
    )
}

/// Drives `fut` inside `span`, records how long it took on the span and
/// warns on target `performance` when it ran longer than `slow_after`.
///
/// Time is read from the Tokio clock, so paused-clock tests see virtual time.
pub async fn run_timed<F>(span: Span, slow_after: Duration, fut: F) -> F::Output
where
    F: Future,
{
    let started = Instant::now();
    let out = fut.instrument(span.clone()).await;
    let elapsed = started.elapsed();

    let elapsed_ms = elapsed.as_millis() as u64;
    span.record("elapsed_ms", elapsed_ms);

    if elapsed > slow_after {
        span.in_scope(|| {
            tracing::warn!(
                target: "performance",
                elapsed_ms,
                slow_after_ms = slow_after.as_millis() as u64,
                "slow observer call"
            );
        });
    }
    out
}
