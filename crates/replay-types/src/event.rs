//! The immutable game event and its typed payloads.
//!
//! A [`GameEvent`] is ordered by `(game_id, sequence_no)`, never by arrival
//! time. The payload stays a raw [`serde_json::Value`] on the event itself
//! so unknown event types can be stored and skipped during projection
//! (event schemas evolve ahead of this service). The typed payload structs
//! here are what the projector's transition functions deserialize into.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{EntityId, GameId};
use crate::state::EntityKind;

/// Well-known `event_type` discriminants.
///
/// Kept as string constants rather than an enum: the projector dispatches
/// through a registry keyed by these strings, and unknown types must flow
/// through storage untouched.
pub mod event_types {
    /// An entity entered the game.
    pub const ENTITY_SPAWNED: &str = "entity_spawned";
    /// An entity's pose was updated.
    pub const ENTITY_MOVED: &str = "entity_moved";
    /// An entity left the game.
    pub const ENTITY_DESPAWNED: &str = "entity_despawned";
    /// The game score changed by a delta.
    pub const SCORE_CHANGED: &str = "score_changed";
    /// The game finished.
    pub const GAME_ENDED: &str = "game_ended";
}

/// A single immutable event in a game's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    /// The game this event belongs to.
    pub game_id: GameId,
    /// Strictly increasing, unique per game. The ordering key.
    pub sequence_no: u64,
    /// Open-ended event type discriminant.
    pub event_type: String,
    /// Type-specific structured payload.
    pub payload: serde_json::Value,
    /// Game time at which the event occurred.
    pub occurred_at: DateTime<Utc>,
}

/// Outcome of appending an event to the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The event was stored as the next entry in the game's sequence.
    Accepted,
    /// The `(game_id, sequence_no)` pair was already stored; nothing changed.
    Duplicate,
}

/// Payload of [`event_types::ENTITY_SPAWNED`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySpawned {
    /// The entity being introduced.
    pub entity_id: EntityId,
    /// What kind of entity it is.
    pub kind: EntityKind,
    /// Initial x position in game coordinates.
    pub x: f64,
    /// Initial y position in game coordinates.
    pub y: f64,
    /// Initial radius in game units.
    pub radius: f64,
}

/// Payload of [`event_types::ENTITY_MOVED`].
///
/// Replaces the entity's pose. A missing `radius` keeps the previous one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMoved {
    /// The entity whose pose changes.
    pub entity_id: EntityId,
    /// New x position in game coordinates.
    pub x: f64,
    /// New y position in game coordinates.
    pub y: f64,
    /// New radius, if it changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
}

/// Payload of [`event_types::ENTITY_DESPAWNED`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDespawned {
    /// The entity leaving the game.
    pub entity_id: EntityId,
}

/// Payload of [`event_types::SCORE_CHANGED`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreChanged {
    /// Signed score delta applied to the game score.
    pub delta: i64,
}

/// Payload of [`event_types::GAME_ENDED`]. Carries no fields today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GameEnded {}

impl GameEvent {
    /// Build an event with a typed payload, serializing it to JSON.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] if the payload cannot be serialized.
    pub fn with_payload<P: Serialize>(
        game_id: GameId,
        sequence_no: u64,
        event_type: &str,
        payload: &P,
        occurred_at: DateTime<Utc>,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            game_id,
            sequence_no,
            event_type: event_type.to_owned(),
            payload: serde_json::to_value(payload)?,
            occurred_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn event_round_trips_through_json() {
        let occurred_at = Utc.timestamp_opt(1_000, 0).single().unwrap_or_default();
        let event = GameEvent::with_payload(
            GameId::new("g1"),
            0,
            event_types::ENTITY_SPAWNED,
            &EntitySpawned {
                entity_id: EntityId::new("alice"),
                kind: EntityKind::Player,
                x: 10.0,
                y: 20.0,
                radius: 5.0,
            },
            occurred_at,
        )
        .unwrap_or_else(|e| panic!("serialize: {e}"));

        let json = serde_json::to_string(&event).unwrap_or_default();
        let back: GameEvent = serde_json::from_str(&json)
            .unwrap_or_else(|e| panic!("deserialize: {e}"));
        assert_eq!(back, event);
        assert_eq!(back.event_type, "entity_spawned");
    }

    #[test]
    fn moved_payload_radius_is_optional() {
        let payload: EntityMoved =
            serde_json::from_value(serde_json::json!({"entity_id": "a", "x": 1.0, "y": 2.0}))
                .unwrap_or_else(|e| panic!("deserialize: {e}"));
        assert_eq!(payload.radius, None);
    }
}
