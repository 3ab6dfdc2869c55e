//! Replay window parameters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::GameId;

/// Parameters of a replay request: which slice of game time to replay and
/// how to pace it.
///
/// `from_time` defaults to the game's first event and `to_time` to its
/// latest event time; both are resolved against the event log before
/// sampling. The window is inclusive-exclusive: `[from_time, to_time)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayWindow {
    /// The game to replay.
    pub game_id: GameId,
    /// Window start (inclusive); `None` means the first event.
    pub from_time: Option<DateTime<Utc>>,
    /// Window end (exclusive); `None` means the latest event time.
    pub to_time: Option<DateTime<Utc>>,
    /// Output frames per second.
    pub fps: u32,
    /// Speed multiplier: game seconds advanced per rendered second.
    pub speed: f64,
}

impl ReplayWindow {
    /// Default output frame rate.
    pub const DEFAULT_FPS: u32 = 30;
    /// Default playback speed (real time).
    pub const DEFAULT_SPEED: f64 = 1.0;

    /// A full-game window at default pacing.
    #[must_use]
    pub const fn full_game(game_id: GameId) -> Self {
        Self {
            game_id,
            from_time: None,
            to_time: None,
            fps: Self::DEFAULT_FPS,
            speed: Self::DEFAULT_SPEED,
        }
    }
}
