use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::SequenceId;

pub type ObserverFuture = BoxFuture<'static, anyhow::Result<()>>;

/// A thread-safe async callback invoked once per newly discovered id.
pub type Observer = Arc<dyn Fn(SequenceId) -> ObserverFuture + Send + Sync + 'static>;

/// Opaque registration handle. Drawn from a per-watcher monotonic counter, so
/// it never collides and orders observers by registration time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverToken(pub(crate) u64);

impl fmt::Display for ObserverToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obs-{}", self.0)
    }
}

/// Boxes an async closure into an [`Observer`].
pub fn observer<F, Fut>(f: F) -> Observer
where
    F: Fn(SequenceId) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |id| f(id).boxed())
}
