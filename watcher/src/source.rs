use async_trait::async_trait;

use crate::SequenceId;

/// The single backend operation the watcher depends on.
#[async_trait]
pub trait SequenceSource: Send + Sync + 'static {
    /// Returns the id the backend will assign to the next created item.
    async fn fetch_next_sequence_id(&self) -> anyhow::Result<SequenceId>;
}
