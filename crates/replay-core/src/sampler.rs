//! Replay window sampling.
//!
//! A replay window covers game time `[from_time, to_time)` and is rendered
//! at `fps` output frames per second with a `speed` multiplier (game
//! seconds advanced per rendered second). The game-time step between
//! samples is `dt = speed / fps`, and the frame count obeys
//! `ceil(fps * (to - from) / speed)` -- an empty window yields zero frames.
//!
//! Sampling drives a single [`ProjectionCursor`] over the event sequence,
//! which the caller fetches once per replay: events appended after that
//! fetch never affect an in-flight replay.

use chrono::{DateTime, TimeDelta, Utc};
use replay_types::{GameEvent, GameState, ReplayWindow};

use crate::error::SampleError;
use crate::projector::{ProjectionCursor, TransitionTable};

/// A replay window with its defaults resolved against the event log and
/// its parameters validated.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedWindow {
    /// The game being replayed.
    pub game_id: replay_types::GameId,
    /// Window start (inclusive).
    pub from_time: DateTime<Utc>,
    /// Window end (exclusive).
    pub to_time: DateTime<Utc>,
    /// Output frames per second.
    pub fps: u32,
    /// Speed multiplier.
    pub speed: f64,
}

impl ResolvedWindow {
    /// Window duration in game seconds (never negative).
    #[must_use]
    pub fn duration_secs(&self) -> f64 {
        nanos_to_secs(self.to_time - self.from_time).max(0.0)
    }

    /// Number of frames this window produces: `ceil(fps * duration / speed)`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn frame_count(&self) -> u64 {
        let frames = (f64::from(self.fps) * self.duration_secs() / self.speed).ceil();
        if frames.is_sign_negative() || frames.is_nan() {
            return 0;
        }
        // f64 -> u64 saturates at the representable maximum.
        frames as u64
    }

    /// Rendered duration of the resulting video in seconds:
    /// `(to - from) / speed`.
    #[must_use]
    pub fn video_duration_secs(&self) -> f64 {
        self.duration_secs() / self.speed
    }

    /// The ordered sample timestamps: `from, from + dt, from + 2dt, ...`,
    /// all strictly less than `to`, with `dt = speed / fps` game seconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn sample_timestamps(&self) -> Vec<DateTime<Utc>> {
        let dt_secs = self.speed / f64::from(self.fps);
        let count = self.frame_count();
        // Capacity stays bounded even for a window that bypassed
        // `resolve_window` and its frame-count cap.
        let capacity = usize::try_from(count.min(MAX_FRAME_COUNT)).unwrap_or(0);
        let mut timestamps = Vec::with_capacity(capacity);
        for i in 0..count {
            // Offsets are computed from the window start each step so
            // rounding error never accumulates across a long window.
            let offset = secs_to_delta(i as f64 * dt_secs);
            let ts = self.from_time + offset;
            if ts >= self.to_time {
                break;
            }
            timestamps.push(ts);
        }
        timestamps
    }
}

/// Upper bound on frames a single replay request may produce (two hours of
/// output at the default 30 fps). State is constant outside a game's event
/// bounds, so after clamping, only a degenerate `speed` can reach this.
pub const MAX_FRAME_COUNT: u64 = 216_000;

/// Resolve a [`ReplayWindow`]'s defaults against the game's event-time
/// bounds and validate its parameters.
///
/// `from_time` defaults to the first event, `to_time` to the latest event
/// time; explicit times are clamped to the event bounds (state is constant
/// outside them, so out-of-bounds frames carry no information and an
/// oversized window must not translate into unbounded work). Returns
/// `Ok(None)` when the game has no events (the caller decides whether that
/// is a 404 or an empty result).
///
/// # Errors
///
/// Returns [`SampleError`] for a non-positive `fps` or `speed`, a window
/// whose start lies after its end, or a window that would produce more
/// than [`MAX_FRAME_COUNT`] frames.
pub fn resolve_window(
    window: &ReplayWindow,
    bounds: Option<(DateTime<Utc>, DateTime<Utc>)>,
) -> Result<Option<ResolvedWindow>, SampleError> {
    if window.fps == 0 {
        return Err(SampleError::InvalidFps);
    }
    if !window.speed.is_finite() || window.speed <= 0.0 {
        return Err(SampleError::InvalidSpeed(window.speed));
    }
    if let (Some(from), Some(to)) = (window.from_time, window.to_time)
        && from > to
    {
        return Err(SampleError::InvalidWindow { from, to });
    }

    let Some((first, last)) = bounds else {
        return Ok(None);
    };

    // Clamping is monotone, so from_time <= to_time still holds; a window
    // entirely outside the bounds collapses to zero frames.
    let from_time = window.from_time.map_or(first, |t| t.clamp(first, last));
    let to_time = window.to_time.map_or(last, |t| t.clamp(first, last));

    let resolved = ResolvedWindow {
        game_id: window.game_id.clone(),
        from_time,
        to_time,
        fps: window.fps,
        speed: window.speed,
    };
    let frames = resolved.frame_count();
    if frames > MAX_FRAME_COUNT {
        return Err(SampleError::WindowTooLarge {
            frames,
            max: MAX_FRAME_COUNT,
        });
    }
    Ok(Some(resolved))
}

/// Materialize `(timestamp, state)` pairs for every sample in the window.
///
/// `events` must be the game's full ordered history up to `to_time`
/// (`query(game_id, None, Some(to_time))`): the fold starts from the empty
/// state, so events before `from_time` are required to seed the state at
/// the first sample.
#[must_use]
pub fn sample(
    table: &TransitionTable,
    window: &ResolvedWindow,
    events: &[GameEvent],
) -> Vec<(DateTime<Utc>, GameState)> {
    let mut cursor =
        ProjectionCursor::new(table, window.game_id.clone(), events, window.from_time);
    window
        .sample_timestamps()
        .into_iter()
        .map(|ts| (ts, cursor.advance_to(ts).clone()))
        .collect()
}

/// Convert a `TimeDelta` to fractional seconds.
#[allow(clippy::cast_precision_loss)]
fn nanos_to_secs(delta: TimeDelta) -> f64 {
    delta.num_nanoseconds().map_or_else(
        || delta.num_seconds() as f64,
        |nanos| nanos as f64 / 1_000_000_000.0,
    )
}

/// Convert fractional seconds to a `TimeDelta` with nanosecond rounding.
#[allow(clippy::cast_possible_truncation)]
fn secs_to_delta(secs: f64) -> TimeDelta {
    TimeDelta::nanoseconds((secs * 1_000_000_000.0).round() as i64)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use replay_types::{GameId, event_types};

    use super::*;

    fn ts(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).single().unwrap()
    }

    fn window(from: i64, to: i64, fps: u32, speed: f64) -> ResolvedWindow {
        ResolvedWindow {
            game_id: GameId::new("g"),
            from_time: ts(from),
            to_time: ts(to),
            fps,
            speed,
        }
    }

    #[test]
    fn frame_count_law_holds() {
        // fps=10, speed=2, window [0, 2): exactly 10 frames.
        assert_eq!(window(0, 2_000, 10, 2.0).frame_count(), 10);
        // fps=30, speed=1, window [0, 1): 30 frames.
        assert_eq!(window(0, 1_000, 30, 1.0).frame_count(), 30);
        // Fractional result rounds up.
        assert_eq!(window(0, 1_050, 10, 1.0).frame_count(), 11);
        // Empty window: zero frames.
        assert_eq!(window(500, 500, 30, 1.0).frame_count(), 0);
    }

    #[test]
    fn sample_timestamps_step_by_speed_over_fps() {
        // fps=10, speed=2 => dt = 0.2 game seconds.
        let w = window(0, 2_000, 10, 2.0);
        let timestamps = w.sample_timestamps();
        assert_eq!(timestamps.len(), 10);
        assert_eq!(timestamps[0], ts(0));
        assert_eq!(timestamps[1], ts(200));
        assert_eq!(timestamps[9], ts(1_800));
        assert!(timestamps.iter().all(|&t| t < w.to_time));
    }

    #[test]
    fn empty_window_yields_no_timestamps() {
        assert!(window(500, 500, 30, 1.0).sample_timestamps().is_empty());
    }

    #[test]
    fn video_duration_is_window_over_speed() {
        let w = window(0, 2_000, 10, 2.0);
        assert!((w.video_duration_secs() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn resolve_rejects_invalid_parameters() {
        let mut w = ReplayWindow::full_game(GameId::new("g"));
        w.fps = 0;
        assert!(matches!(
            resolve_window(&w, Some((ts(0), ts(1)))),
            Err(SampleError::InvalidFps)
        ));

        let mut w = ReplayWindow::full_game(GameId::new("g"));
        w.speed = -1.0;
        assert!(matches!(
            resolve_window(&w, Some((ts(0), ts(1)))),
            Err(SampleError::InvalidSpeed(_))
        ));

        let mut w = ReplayWindow::full_game(GameId::new("g"));
        w.from_time = Some(ts(10));
        w.to_time = Some(ts(5));
        assert!(matches!(
            resolve_window(&w, None),
            Err(SampleError::InvalidWindow { .. })
        ));
    }

    #[test]
    fn resolve_clamps_explicit_window_to_event_bounds() {
        // A 200-year window over a one-second game must not turn into
        // hundreds of billions of samples: state is constant outside the
        // event bounds, so the window clamps to them.
        let mut w = ReplayWindow::full_game(GameId::new("g"));
        w.from_time = Some(ts(-86_400_000));
        w.to_time = Some(ts(6_311_520_000_000));
        w.fps = 60;
        let resolved = resolve_window(&w, Some((ts(0), ts(1_000)))).unwrap().unwrap();
        assert_eq!(resolved.from_time, ts(0));
        assert_eq!(resolved.to_time, ts(1_000));
        assert_eq!(resolved.frame_count(), 60);
    }

    #[test]
    fn resolve_collapses_window_outside_event_bounds() {
        // Entirely after the last event: nothing to show, zero frames.
        let mut w = ReplayWindow::full_game(GameId::new("g"));
        w.from_time = Some(ts(5_000));
        w.to_time = Some(ts(9_000));
        let resolved = resolve_window(&w, Some((ts(0), ts(1_000)))).unwrap().unwrap();
        assert_eq!(resolved.frame_count(), 0);
    }

    #[test]
    fn resolve_rejects_excessive_frame_counts() {
        // Within bounds, a degenerate speed can still demand unbounded
        // work; the frame-count cap rejects it up front.
        let mut w = ReplayWindow::full_game(GameId::new("g"));
        w.speed = 1e-9;
        let err = resolve_window(&w, Some((ts(0), ts(1_000)))).unwrap_err();
        assert!(matches!(
            err,
            SampleError::WindowTooLarge {
                max: MAX_FRAME_COUNT,
                ..
            }
        ));
    }

    #[test]
    fn resolve_without_events_is_none_even_with_explicit_times() {
        let mut w = ReplayWindow::full_game(GameId::new("g"));
        w.from_time = Some(ts(0));
        w.to_time = Some(ts(1_000));
        assert_eq!(resolve_window(&w, None).unwrap(), None);
    }

    #[test]
    fn resolve_defaults_to_event_bounds() {
        let w = ReplayWindow::full_game(GameId::new("g"));
        let resolved = resolve_window(&w, Some((ts(100), ts(900)))).unwrap().unwrap();
        assert_eq!(resolved.from_time, ts(100));
        assert_eq!(resolved.to_time, ts(900));
    }

    #[test]
    fn resolve_without_bounds_or_times_is_none() {
        let w = ReplayWindow::full_game(GameId::new("g"));
        assert_eq!(resolve_window(&w, None).unwrap(), None);
    }

    #[test]
    fn sample_holds_last_value_between_events() {
        let table = TransitionTable::standard();
        let events = vec![
            GameEvent {
                game_id: GameId::new("g"),
                sequence_no: 0,
                event_type: event_types::SCORE_CHANGED.to_owned(),
                payload: serde_json::json!({"delta": 5}),
                occurred_at: ts(0),
            },
            GameEvent {
                game_id: GameId::new("g"),
                sequence_no: 1,
                event_type: event_types::SCORE_CHANGED.to_owned(),
                payload: serde_json::json!({"delta": 7}),
                occurred_at: ts(1_000),
            },
        ];
        // fps=2, speed=1 => samples at 0.0s, 0.5s, 1.0s, 1.5s.
        let w = window(0, 2_000, 2, 1.0);
        let samples = sample(&table, &w, &events);
        assert_eq!(samples.len(), 4);
        assert_eq!(samples[0].1.score, 5);
        assert_eq!(samples[1].1.score, 5);
        assert_eq!(samples[2].1.score, 12);
        assert_eq!(samples[3].1.score, 12);
        // Each sampled state is tagged with its sample timestamp.
        assert_eq!(samples[1].1.as_of, samples[1].0);
    }

    #[test]
    fn sample_seeds_state_from_history_before_window() {
        let table = TransitionTable::standard();
        let events = vec![GameEvent {
            game_id: GameId::new("g"),
            sequence_no: 0,
            event_type: event_types::SCORE_CHANGED.to_owned(),
            payload: serde_json::json!({"delta": 3}),
            occurred_at: ts(0),
        }];
        // Window starts after the event; the fold must still include it.
        let w = window(1_000, 1_500, 2, 1.0);
        let samples = sample(&table, &w, &events);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].1.score, 3);
    }
}
