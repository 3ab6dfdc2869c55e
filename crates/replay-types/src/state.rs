//! Derived game state.
//!
//! [`GameState`] is never persisted -- it is produced fresh by folding a
//! game's event log up to a timestamp. Two folds over the same event prefix
//! with the same `as_of` must yield identical state, so all collections are
//! `BTreeMap`s with deterministic iteration order.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{EntityId, GameId};

/// The kind of an entity on the game board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// A player-controlled circle.
    Player,
    /// A food item.
    Food,
}

/// Lifecycle status of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// The game is still receiving events.
    InProgress,
    /// A `game_ended` event has been applied.
    Completed,
}

/// A single entity's pose and attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// What kind of entity this is.
    pub kind: EntityKind,
    /// x position in game coordinates.
    pub x: f64,
    /// y position in game coordinates.
    pub y: f64,
    /// Radius in game units.
    pub radius: f64,
}

/// Point-in-time state of a game, derived from its event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// The game this state belongs to.
    pub game_id: GameId,
    /// Live entities keyed by id.
    pub entities: BTreeMap<EntityId, Entity>,
    /// Cumulative game score.
    pub score: i64,
    /// Lifecycle status.
    pub status: GameStatus,
    /// The timestamp this state was reconstructed for.
    pub as_of: DateTime<Utc>,
}

impl GameState {
    /// The defined empty state before any event has occurred.
    #[must_use]
    pub fn empty(game_id: GameId, as_of: DateTime<Utc>) -> Self {
        Self {
            game_id,
            entities: BTreeMap::new(),
            score: 0,
            status: GameStatus::InProgress,
            as_of,
        }
    }
}
