//! Shared type definitions for the replay service.
//!
//! Events are the source of truth -- game state is never persisted, it is
//! reconstructed by folding the per-game event log. This crate defines the
//! event model, the derived state model, and the replay window parameters
//! shared by every other crate in the workspace.

pub mod event;
pub mod ids;
pub mod state;
pub mod window;

pub use event::{
    AppendOutcome, EntityDespawned, EntityMoved, EntitySpawned, GameEnded, GameEvent,
    ScoreChanged, event_types,
};
pub use ids::{EntityId, GameId};
pub use state::{Entity, EntityKind, GameState, GameStatus};
pub use window::ReplayWindow;
