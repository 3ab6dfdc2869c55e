//! In-memory event log backend.
//!
//! Each game's events live behind their own [`Mutex`], so appends to one
//! game never block appends to another (single-writer-per-game, no global
//! write lock). The outer map is only write-locked for the brief moment a
//! new game id is first seen.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use replay_types::{AppendOutcome, GameEvent, GameId};
use tokio::sync::{Mutex, RwLock};

use crate::error::StoreError;

/// One game's ordered, gapless event sequence.
#[derive(Debug, Default)]
struct GameLog {
    /// Events in strictly increasing `sequence_no` order.
    events: Vec<GameEvent>,
}

impl GameLog {
    /// The sequence number the log accepts next.
    fn next_sequence(&self) -> u64 {
        self.events
            .last()
            .map_or(0, |e| e.sequence_no.saturating_add(1))
    }
}

/// In-memory event log keyed by game id.
#[derive(Debug, Default)]
pub struct MemoryEventStore {
    games: RwLock<HashMap<GameId, Arc<Mutex<GameLog>>>>,
}

impl MemoryEventStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the per-game log handle, creating it on first sight.
    async fn log_handle(&self, game_id: &GameId) -> Arc<Mutex<GameLog>> {
        if let Some(log) = self.games.read().await.get(game_id) {
            return Arc::clone(log);
        }
        let mut games = self.games.write().await;
        Arc::clone(games.entry(game_id.clone()).or_default())
    }

    /// Append an event in strict sequence order.
    ///
    /// Accepts only `sequence_no == last_known + 1` (the first event of a
    /// game must carry sequence 0). An already-stored sequence number is a
    /// no-op [`AppendOutcome::Duplicate`]; a sequence ahead of the expected
    /// one is a [`StoreError::SequenceGap`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::SequenceGap`] when the event skips ahead.
    pub async fn append(&self, event: GameEvent) -> Result<AppendOutcome, StoreError> {
        let handle = self.log_handle(&event.game_id).await;
        let mut log = handle.lock().await;
        let expected = log.next_sequence();
        if event.sequence_no == expected {
            log.events.push(event);
            Ok(AppendOutcome::Accepted)
        } else if event.sequence_no < expected {
            // The log is gapless, so a lower sequence number is already stored.
            Ok(AppendOutcome::Duplicate)
        } else {
            Err(StoreError::SequenceGap {
                game_id: event.game_id,
                expected,
                got: event.sequence_no,
            })
        }
    }

    /// Query events with `occurred_at` in `[from_time, to_time)`, ordered by
    /// `sequence_no`. Unbounded on either side when `None`. An unknown game
    /// yields an empty list, not an error.
    pub async fn query(
        &self,
        game_id: &GameId,
        from_time: Option<DateTime<Utc>>,
        to_time: Option<DateTime<Utc>>,
    ) -> Vec<GameEvent> {
        let Some(handle) = self.games.read().await.get(game_id).map(Arc::clone) else {
            return Vec::new();
        };
        let log = handle.lock().await;
        log.events
            .iter()
            .filter(|e| from_time.is_none_or(|from| e.occurred_at >= from))
            .filter(|e| to_time.is_none_or(|to| e.occurred_at < to))
            .cloned()
            .collect()
    }

    /// Earliest and latest `occurred_at` for a game, or `None` if the game
    /// has no events.
    pub async fn bounds(&self, game_id: &GameId) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let handle = self.games.read().await.get(game_id).map(Arc::clone)?;
        let log = handle.lock().await;
        let first = log.events.iter().map(|e| e.occurred_at).min()?;
        let last = log.events.iter().map(|e| e.occurred_at).max()?;
        Some((first, last))
    }

    /// The latest stored sequence number for a game, if any.
    pub async fn last_sequence(&self, game_id: &GameId) -> Option<u64> {
        let handle = self.games.read().await.get(game_id).map(Arc::clone)?;
        let log = handle.lock().await;
        log.events.last().map(|e| e.sequence_no)
    }
}
