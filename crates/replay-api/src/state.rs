//! Shared application state for the replay API server.

use std::sync::Arc;
use std::time::Duration;

use replay_core::TransitionTable;
use replay_render::{FrameRenderer, VideoEncoder};
use replay_store::EventStore;

use crate::pool::RenderPool;

/// Default per-request encoding timeout budget.
pub const DEFAULT_ENCODE_TIMEOUT: Duration = Duration::from_secs(120);

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor. The store
/// is the only piece shared with the write path; everything else is
/// read-path machinery.
#[derive(Debug)]
pub struct AppState {
    /// The event log both paths share.
    pub store: Arc<EventStore>,
    /// Event-type dispatch table for projection.
    pub table: TransitionTable,
    /// Frame renderer (validated at startup).
    pub renderer: FrameRenderer,
    /// External-process video encoder.
    pub encoder: VideoEncoder,
    /// Bounded render/encode worker pool.
    pub pool: RenderPool,
    /// Per-request encoding timeout budget.
    pub encode_timeout: Duration,
}

impl AppState {
    /// Assemble the application state with the standard transition table.
    #[must_use]
    pub fn new(
        store: Arc<EventStore>,
        renderer: FrameRenderer,
        encoder: VideoEncoder,
        pool: RenderPool,
        encode_timeout: Duration,
    ) -> Self {
        Self {
            store,
            table: TransitionTable::standard(),
            renderer,
            encoder,
            pool,
            encode_timeout,
        }
    }
}
