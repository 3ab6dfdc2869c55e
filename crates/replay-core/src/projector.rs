//! Deterministic projection of game state from ordered event sequences.
//!
//! The fold contract: state at timestamp `t` is the result of applying, in
//! `sequence_no` order, every event with `occurred_at <= t` to the empty
//! state. The fold is pure -- no clocks, no I/O -- so the same event prefix
//! and `as_of` always produce identical state, across calls and across
//! process restarts.
//!
//! Event dispatch goes through a [`TransitionTable`] keyed by the
//! `event_type` string. New event types are registered without touching
//! the fold loop, and unknown types are skipped with a warning rather than
//! failing the fold: event schemas evolve ahead of this service.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use replay_types::{
    Entity, EntityDespawned, EntityMoved, EntitySpawned, GameEvent, GameId, GameState,
    GameStatus, ScoreChanged, event_types,
};
use tracing::warn;

use crate::error::ProjectionError;

/// A pure state-transition rule for one event type.
pub type TransitionFn = fn(&mut GameState, &serde_json::Value) -> Result<(), ProjectionError>;

/// Registry mapping `event_type` strings to transition functions.
#[derive(Debug, Clone)]
pub struct TransitionTable {
    transitions: HashMap<String, TransitionFn>,
}

impl TransitionTable {
    /// An empty table with no registered event types.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            transitions: HashMap::new(),
        }
    }

    /// The standard table covering every event type this service knows.
    #[must_use]
    pub fn standard() -> Self {
        let mut table = Self::empty();
        table.register(event_types::ENTITY_SPAWNED, apply_entity_spawned);
        table.register(event_types::ENTITY_MOVED, apply_entity_moved);
        table.register(event_types::ENTITY_DESPAWNED, apply_entity_despawned);
        table.register(event_types::SCORE_CHANGED, apply_score_changed);
        table.register(event_types::GAME_ENDED, apply_game_ended);
        table
    }

    /// Register a transition for an event type, replacing any existing one.
    pub fn register(&mut self, event_type: impl Into<String>, transition: TransitionFn) {
        self.transitions.insert(event_type.into(), transition);
    }

    /// Apply a single event to the state.
    ///
    /// Unknown event types and malformed payloads are logged and skipped;
    /// neither aborts the fold.
    pub fn apply(&self, state: &mut GameState, event: &GameEvent) {
        match self.transitions.get(event.event_type.as_str()) {
            Some(transition) => {
                if let Err(e) = transition(state, &event.payload) {
                    warn!(
                        game_id = %event.game_id,
                        sequence_no = event.sequence_no,
                        event_type = %event.event_type,
                        error = %e,
                        "skipping event with malformed payload"
                    );
                }
            }
            None => {
                warn!(
                    game_id = %event.game_id,
                    sequence_no = event.sequence_no,
                    event_type = %event.event_type,
                    "skipping unknown event type"
                );
            }
        }
    }
}

impl Default for TransitionTable {
    fn default() -> Self {
        Self::standard()
    }
}

fn apply_entity_spawned(
    state: &mut GameState,
    payload: &serde_json::Value,
) -> Result<(), ProjectionError> {
    let spawned: EntitySpawned = serde_json::from_value(payload.clone())?;
    state.entities.insert(
        spawned.entity_id,
        Entity {
            kind: spawned.kind,
            x: spawned.x,
            y: spawned.y,
            radius: spawned.radius,
        },
    );
    Ok(())
}

fn apply_entity_moved(
    state: &mut GameState,
    payload: &serde_json::Value,
) -> Result<(), ProjectionError> {
    let moved: EntityMoved = serde_json::from_value(payload.clone())?;
    // Moves for entities that never spawned (or already despawned) are
    // silently dropped; there is nothing to update.
    if let Some(entity) = state.entities.get_mut(&moved.entity_id) {
        entity.x = moved.x;
        entity.y = moved.y;
        if let Some(radius) = moved.radius {
            entity.radius = radius;
        }
    }
    Ok(())
}

fn apply_entity_despawned(
    state: &mut GameState,
    payload: &serde_json::Value,
) -> Result<(), ProjectionError> {
    let despawned: EntityDespawned = serde_json::from_value(payload.clone())?;
    state.entities.remove(&despawned.entity_id);
    Ok(())
}

fn apply_score_changed(
    state: &mut GameState,
    payload: &serde_json::Value,
) -> Result<(), ProjectionError> {
    let change: ScoreChanged = serde_json::from_value(payload.clone())?;
    state.score = state.score.saturating_add(change.delta);
    Ok(())
}

fn apply_game_ended(
    state: &mut GameState,
    _payload: &serde_json::Value,
) -> Result<(), ProjectionError> {
    state.status = GameStatus::Completed;
    Ok(())
}

/// Reconstruct game state at `as_of` by folding the ordered event sequence
/// from the empty state.
///
/// Applies every event with `occurred_at <= as_of` and stops at the first
/// event beyond it. State before the first event is the defined empty state.
#[must_use]
pub fn project(
    table: &TransitionTable,
    game_id: GameId,
    events: &[GameEvent],
    as_of: DateTime<Utc>,
) -> GameState {
    let mut state = GameState::empty(game_id, as_of);
    for event in events {
        if event.occurred_at > as_of {
            break;
        }
        table.apply(&mut state, event);
    }
    state
}

/// Resumable fold over one event sequence.
///
/// A sampling pass asks for state at a monotonically nondecreasing run of
/// timestamps; restarting the fold for each sample would make the pass
/// quadratic. The cursor keeps the folded state and the next unapplied
/// index, so a full pass is a single amortized linear scan.
///
/// `advance_to` requires nondecreasing `as_of` values; events already
/// applied are never rewound.
#[derive(Debug)]
pub struct ProjectionCursor<'a> {
    table: &'a TransitionTable,
    events: &'a [GameEvent],
    state: GameState,
    next: usize,
}

impl<'a> ProjectionCursor<'a> {
    /// Start a cursor at the empty state with no events applied.
    #[must_use]
    pub fn new(
        table: &'a TransitionTable,
        game_id: GameId,
        events: &'a [GameEvent],
        start: DateTime<Utc>,
    ) -> Self {
        Self {
            table,
            events,
            state: GameState::empty(game_id, start),
            next: 0,
        }
    }

    /// Advance the fold so the held state reflects all events with
    /// `occurred_at <= as_of`, and return it.
    pub fn advance_to(&mut self, as_of: DateTime<Utc>) -> &GameState {
        while let Some(event) = self.events.get(self.next) {
            if event.occurred_at > as_of {
                break;
            }
            self.table.apply(&mut self.state, event);
            self.next = self.next.saturating_add(1);
        }
        self.state.as_of = as_of;
        &self.state
    }
}

/// Project one state per event whose `occurred_at` falls inside
/// `[from_time, to_time)`, each reflecting the log up to and including
/// that event. Unbounded on either side when `None`.
///
/// This backs the states endpoint: the caller passes the full history up
/// to `to_time` so states inside the window are seeded correctly.
#[must_use]
pub fn states_at_events(
    table: &TransitionTable,
    game_id: GameId,
    events: &[GameEvent],
    from_time: Option<DateTime<Utc>>,
    to_time: Option<DateTime<Utc>>,
) -> Vec<GameState> {
    let start = events.first().map_or_else(Utc::now, |e| e.occurred_at);
    let mut state = GameState::empty(game_id, start);
    let mut states = Vec::new();
    for event in events {
        if to_time.is_some_and(|to| event.occurred_at >= to) {
            break;
        }
        table.apply(&mut state, event);
        state.as_of = event.occurred_at;
        if from_time.is_none_or(|from| event.occurred_at >= from) {
            states.push(state.clone());
        }
    }
    states
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use replay_types::{EntityId, EntityKind};

    use super::*;

    fn ts(secs_x10: i64) -> DateTime<Utc> {
        // Tenths of a second keep fractional timestamps (t = 1.5) exact.
        Utc.timestamp_millis_opt(secs_x10.saturating_mul(100))
            .single()
            .unwrap()
    }

    fn spawn(seq: u64, at: i64, id: &str, x: f64) -> GameEvent {
        GameEvent::with_payload(
            GameId::new("g"),
            seq,
            event_types::ENTITY_SPAWNED,
            &EntitySpawned {
                entity_id: EntityId::new(id),
                kind: EntityKind::Player,
                x,
                y: 0.0,
                radius: 1.0,
            },
            ts(at),
        )
        .unwrap()
    }

    fn mv(seq: u64, at: i64, id: &str, x: f64) -> GameEvent {
        GameEvent::with_payload(
            GameId::new("g"),
            seq,
            event_types::ENTITY_MOVED,
            &EntityMoved {
                entity_id: EntityId::new(id),
                x,
                y: 0.0,
                radius: None,
            },
            ts(at),
        )
        .unwrap()
    }

    fn score(seq: u64, at: i64, delta: i64) -> GameEvent {
        GameEvent::with_payload(
            GameId::new("g"),
            seq,
            event_types::SCORE_CHANGED,
            &ScoreChanged { delta },
            ts(at),
        )
        .unwrap()
    }

    /// Events [spawn(A, t=0), move(A, x=5, t=1), score(+10, t=2)].
    fn scenario_events() -> Vec<GameEvent> {
        vec![spawn(0, 0, "A", 0.0), mv(1, 10, "A", 5.0), score(2, 20, 10)]
    }

    #[test]
    fn state_between_events_holds_last_value() {
        let table = TransitionTable::standard();
        let events = scenario_events();

        // t = 1.5: A is at x=5, score still 0.
        let state = project(&table, GameId::new("g"), &events, ts(15));
        let a = state.entities.get(&EntityId::new("A")).unwrap();
        assert!((a.x - 5.0).abs() < f64::EPSILON);
        assert_eq!(state.score, 0);

        // t = 2.5: score is 10.
        let state = project(&table, GameId::new("g"), &events, ts(25));
        assert_eq!(state.score, 10);
    }

    #[test]
    fn state_before_first_event_is_empty() {
        let table = TransitionTable::standard();
        let events = scenario_events();
        let state = project(&table, GameId::new("g"), &events, ts(-10));
        assert_eq!(state, GameState::empty(GameId::new("g"), ts(-10)));
    }

    #[test]
    fn projection_is_deterministic_across_calls() {
        let table = TransitionTable::standard();
        let events = scenario_events();
        let first = project(&table, GameId::new("g"), &events, ts(25));
        let second = project(&table, GameId::new("g"), &events, ts(25));
        assert_eq!(first, second);
    }

    #[test]
    fn event_at_exactly_as_of_is_applied() {
        let table = TransitionTable::standard();
        let events = scenario_events();
        let state = project(&table, GameId::new("g"), &events, ts(20));
        assert_eq!(state.score, 10);
    }

    #[test]
    fn unknown_event_type_is_skipped() {
        let table = TransitionTable::standard();
        let mut events = scenario_events();
        events.push(GameEvent {
            game_id: GameId::new("g"),
            sequence_no: 3,
            event_type: "power_up_collected".to_owned(),
            payload: serde_json::json!({"power": "shield"}),
            occurred_at: ts(30),
        });
        let state = project(&table, GameId::new("g"), &events, ts(40));
        assert_eq!(state.score, 10);
        assert_eq!(state.entities.len(), 1);
    }

    #[test]
    fn malformed_payload_is_skipped() {
        let table = TransitionTable::standard();
        let events = vec![
            spawn(0, 0, "A", 0.0),
            GameEvent {
                game_id: GameId::new("g"),
                sequence_no: 1,
                event_type: event_types::SCORE_CHANGED.to_owned(),
                payload: serde_json::json!({"delta": "not a number"}),
                occurred_at: ts(10),
            },
            score(2, 20, 3),
        ];
        let state = project(&table, GameId::new("g"), &events, ts(30));
        assert_eq!(state.score, 3);
    }

    #[test]
    fn despawn_removes_entity_and_end_completes_game() {
        let table = TransitionTable::standard();
        let events = vec![
            spawn(0, 0, "A", 0.0),
            GameEvent::with_payload(
                GameId::new("g"),
                1,
                event_types::ENTITY_DESPAWNED,
                &EntityDespawned {
                    entity_id: EntityId::new("A"),
                },
                ts(10),
            )
            .unwrap(),
            GameEvent {
                game_id: GameId::new("g"),
                sequence_no: 2,
                event_type: event_types::GAME_ENDED.to_owned(),
                payload: serde_json::json!({}),
                occurred_at: ts(20),
            },
        ];
        let state = project(&table, GameId::new("g"), &events, ts(20));
        assert!(state.entities.is_empty());
        assert_eq!(state.status, GameStatus::Completed);
    }

    #[test]
    fn cursor_matches_fresh_folds_over_monotone_timestamps() {
        let table = TransitionTable::standard();
        let events = scenario_events();
        let mut cursor = ProjectionCursor::new(&table, GameId::new("g"), &events, ts(0));
        for at in [-5, 0, 5, 15, 20, 25, 100] {
            let expected = project(&table, GameId::new("g"), &events, ts(at));
            assert_eq!(cursor.advance_to(ts(at)), &expected, "as_of = {at}");
        }
    }

    #[test]
    fn custom_transition_extends_the_table() {
        let mut table = TransitionTable::standard();
        table.register("score_reset", |state, _payload| {
            state.score = 0;
            Ok(())
        });
        let mut events = scenario_events();
        events.push(GameEvent {
            game_id: GameId::new("g"),
            sequence_no: 3,
            event_type: "score_reset".to_owned(),
            payload: serde_json::json!({}),
            occurred_at: ts(30),
        });
        let state = project(&table, GameId::new("g"), &events, ts(30));
        assert_eq!(state.score, 0);
    }

    #[test]
    fn states_at_events_projects_one_state_per_window_event() {
        let table = TransitionTable::standard();
        let events = scenario_events();
        // Window [1.0, 2.0): only the move event falls inside, but its
        // state must include the earlier spawn.
        let states =
            states_at_events(&table, GameId::new("g"), &events, Some(ts(10)), Some(ts(20)));
        assert_eq!(states.len(), 1);
        let a = states[0].entities.get(&EntityId::new("A")).unwrap();
        assert!((a.x - 5.0).abs() < f64::EPSILON);
        assert_eq!(states[0].as_of, ts(10));
    }

    #[test]
    fn states_at_events_unbounded_returns_all() {
        let table = TransitionTable::standard();
        let events = scenario_events();
        let states = states_at_events(&table, GameId::new("g"), &events, None, None);
        assert_eq!(states.len(), 3);
        assert_eq!(states[2].score, 10);
    }
}
