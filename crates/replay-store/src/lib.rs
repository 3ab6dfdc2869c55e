//! Event log storage for the replay service.
//!
//! The event log is the only thing the write path (ingestion) and read path
//! (replay) share. Two backends implement the same contract: an in-memory
//! store for tests and single-node deployments, and a `PostgreSQL` store
//! for durable history. [`EventStore`] dispatches between them so the rest
//! of the service is backend-agnostic.
//!
//! Contract highlights:
//!
//! - `append` accepts only `last_known + 1` per game; a duplicate
//!   `(game_id, sequence_no)` is a no-op, a gap is an error the caller
//!   logs as a data-integrity warning.
//! - `query` returns events ordered by `sequence_no` with `occurred_at`
//!   in `[from_time, to_time)`; unknown games yield an empty list.

pub mod error;
pub mod memory;
pub mod postgres;

use chrono::{DateTime, Utc};
use replay_types::{AppendOutcome, GameEvent, GameId};

pub use error::StoreError;
pub use memory::MemoryEventStore;
pub use postgres::PgEventStore;

/// Backend-dispatching event store.
#[derive(Debug)]
pub enum EventStore {
    /// In-memory backend (tests, single-node deployments).
    Memory(MemoryEventStore),
    /// `PostgreSQL` backend.
    Postgres(PgEventStore),
}

impl EventStore {
    /// A fresh in-memory store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::Memory(MemoryEventStore::new())
    }

    /// Append an event in strict per-game sequence order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::SequenceGap`] when the event skips ahead of
    /// the next expected sequence number, or a backend error.
    pub async fn append(&self, event: GameEvent) -> Result<AppendOutcome, StoreError> {
        match self {
            Self::Memory(store) => store.append(event).await,
            Self::Postgres(store) => store.append(event).await,
        }
    }

    /// Query events ordered by `sequence_no` with `occurred_at` in
    /// `[from_time, to_time)`.
    ///
    /// # Errors
    ///
    /// Returns a backend error; an unknown game is an empty list, not an
    /// error.
    pub async fn query(
        &self,
        game_id: &GameId,
        from_time: Option<DateTime<Utc>>,
        to_time: Option<DateTime<Utc>>,
    ) -> Result<Vec<GameEvent>, StoreError> {
        match self {
            Self::Memory(store) => Ok(store.query(game_id, from_time, to_time).await),
            Self::Postgres(store) => store.query(game_id, from_time, to_time).await,
        }
    }

    /// Earliest and latest `occurred_at` for a game, or `None` for an
    /// unknown game. Used to resolve replay window defaults.
    ///
    /// # Errors
    ///
    /// Returns a backend error.
    pub async fn bounds(
        &self,
        game_id: &GameId,
    ) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>, StoreError> {
        match self {
            Self::Memory(store) => Ok(store.bounds(game_id).await),
            Self::Postgres(store) => store.bounds(game_id).await,
        }
    }

    /// The latest stored sequence number for a game, if any.
    ///
    /// # Errors
    ///
    /// Returns a backend error.
    pub async fn last_sequence(&self, game_id: &GameId) -> Result<Option<u64>, StoreError> {
        match self {
            Self::Memory(store) => Ok(store.last_sequence(game_id).await),
            Self::Postgres(store) => store.last_sequence(game_id).await,
        }
    }
}
