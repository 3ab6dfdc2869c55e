//! Error types for the event log storage layer.

use replay_types::GameId;

/// Errors that can occur in the storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An append arrived with a sequence number ahead of the next expected
    /// one. The event is not stored; the gap is a data-integrity signal
    /// for the caller to log.
    #[error("sequence gap for game {game_id}: expected {expected}, got {got}")]
    SequenceGap {
        /// The game whose sequence has a gap.
        game_id: GameId,
        /// The next sequence number the log would accept.
        expected: u64,
        /// The sequence number that was offered.
        got: u64,
    },

    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),
}
