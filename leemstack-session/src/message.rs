//! Load events delivered from the background loader to the session.

use leemstack_core::Stack;
use leemstack_io::IngestError;

/// Result of one background load.
#[derive(Debug)]
pub enum LoadEvent {
    /// Ingestion finished; the stack is complete and ready to publish.
    StackReady(Box<Stack>),

    /// Ingestion failed; nothing was produced.
    LoadFailed(IngestError),
}

/// What a session observed when it last checked its loader.
#[derive(Debug)]
pub enum LoadStatus {
    /// No load submitted since the last outcome.
    Idle,
    /// A load is running.
    Loading,
    /// A new stack was published.
    Ready {
        height: usize,
        width: usize,
        depth: usize,
    },
    /// The load failed; the previous stack, if any, is still current.
    Failed(IngestError),
}

impl LoadStatus {
    /// True for [`LoadStatus::Ready`].
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}
