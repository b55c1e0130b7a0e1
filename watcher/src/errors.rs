use std::time::Duration;

use thiserror::Error;

use crate::SequenceId;
use crate::observer::ObserverToken;

/// Watcher failures. `InvalidConfig` is returned by `start`; everything else
/// happens inside the background tick, never stops the watcher and is only
/// logged, counted and reported through `TickOutcome`.
#[derive(Error, Debug)]
pub enum WatcherError {
    #[error("invalid watcher configuration: {0}")]
    InvalidConfig(&'static str),

    #[error("failed to fetch next sequence id: {0:#}")]
    Fetch(#[source] anyhow::Error),

    #[error("observer {token} failed on id {id}: {source:#}")]
    ObserverFailed {
        token: ObserverToken,
        id: SequenceId,
        #[source]
        source: anyhow::Error,
    },

    #[error("observer {token} timed out on id {id} after {timeout:?}")]
    ObserverTimedOut {
        token: ObserverToken,
        id: SequenceId,
        timeout: Duration,
    },

    #[error("observer {token} panicked on id {id}")]
    ObserverPanicked { token: ObserverToken, id: SequenceId },
}
