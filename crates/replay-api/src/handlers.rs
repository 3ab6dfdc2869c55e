//! REST API endpoint handlers for the replay server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/health` | Liveness probe |
//! | `GET` | `/replays/{game_id}/states` | Ordered game states in a window |
//! | `GET` | `/replays/{game_id}/video` | MP4 replay of a window |
//!
//! The states endpoint returns one state per event inside the window (an
//! unknown game is an empty list, not an error). The video endpoint
//! resolves the window against the game's event bounds, samples states at
//! `fps`/`speed`, renders frames, and streams them through the external
//! encoder under a bounded worker pool and a timeout budget.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use replay_core::{resolve_window, sample, states_at_events};
use replay_render::{Frame, VideoArtifact};
use replay_types::{GameEvent, GameId, GameState, ReplayWindow};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

/// Query parameters for `GET /replays/{game_id}/states`.
#[derive(Debug, serde::Deserialize)]
pub struct StatesQuery {
    /// Window start (inclusive, RFC 3339); defaults to the first event.
    pub from_time: Option<DateTime<Utc>>,
    /// Window end (exclusive, RFC 3339); defaults to unbounded.
    pub to_time: Option<DateTime<Utc>>,
}

/// Query parameters for `GET /replays/{game_id}/video`.
#[derive(Debug, serde::Deserialize)]
pub struct VideoQuery {
    /// Output frames per second (default 30).
    pub fps: Option<u32>,
    /// Speed multiplier (default 1.0).
    pub speed: Option<f64>,
    /// Window start (inclusive, RFC 3339); defaults to the first event.
    pub from_time: Option<DateTime<Utc>>,
    /// Window end (exclusive, RFC 3339); defaults to the latest event time.
    pub to_time: Option<DateTime<Utc>>,
}

/// `GET /health` -- liveness probe.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// `GET /replays/{game_id}/states` -- ordered game states, one per event
/// inside `[from_time, to_time)`.
pub async fn get_states(
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<String>,
    Query(query): Query<StatesQuery>,
) -> Result<Json<Vec<GameState>>, ApiError> {
    let game_id = GameId::new(game_id);
    if let (Some(from), Some(to)) = (query.from_time, query.to_time)
        && from > to
    {
        return Err(ApiError::InvalidQuery(format!(
            "from_time {from} is after to_time {to}"
        )));
    }

    // Full history up to to_time: states inside the window are seeded by
    // everything that came before it.
    let events = state.store.query(&game_id, None, query.to_time).await?;
    let states = states_at_events(
        &state.table,
        game_id,
        &events,
        query.from_time,
        query.to_time,
    );
    Ok(Json(states))
}

/// `GET /replays/{game_id}/video` -- MP4 replay of the requested window.
pub async fn get_video(
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<String>,
    Query(query): Query<VideoQuery>,
) -> Result<Response, ApiError> {
    let game_id = GameId::new(game_id);
    let window = ReplayWindow {
        game_id: game_id.clone(),
        from_time: query.from_time,
        to_time: query.to_time,
        fps: query.fps.unwrap_or(ReplayWindow::DEFAULT_FPS),
        speed: query.speed.unwrap_or(ReplayWindow::DEFAULT_SPEED),
    };

    let bounds = state.store.bounds(&game_id).await?;
    let Some(resolved) = resolve_window(&window, bounds)? else {
        return Err(ApiError::NotFound(format!("no events for game {game_id}")));
    };

    // Admission control before any heavy work.
    let _permit = state.pool.acquire().await?;

    // One fetch per replay: events appended from here on do not affect
    // this render.
    let events = state
        .store
        .query(&game_id, None, Some(resolved.to_time))
        .await?;

    info!(
        game_id = %game_id,
        from_time = %resolved.from_time,
        to_time = %resolved.to_time,
        fps = resolved.fps,
        speed = resolved.speed,
        frames = resolved.frame_count(),
        "rendering replay video"
    );

    let artifact = tokio::time::timeout(
        state.encode_timeout,
        render_and_encode(&state, &resolved, events),
    )
    .await
    .map_err(|_| ApiError::Timeout)??;

    debug!(
        game_id = %game_id,
        frames = artifact.frame_count,
        bytes = artifact.data.len(),
        "replay video ready"
    );
    Ok((
        [(header::CONTENT_TYPE, "video/mp4")],
        artifact.data,
    )
        .into_response())
}

/// Sample the window, rasterize every sampled state, and encode.
///
/// Rasterization runs on the blocking pool: it is pure CPU work and must
/// not stall the async executor while the encoder pipe is live.
async fn render_and_encode(
    state: &AppState,
    window: &replay_core::ResolvedWindow,
    events: Vec<GameEvent>,
) -> Result<VideoArtifact, ApiError> {
    let samples = sample(&state.table, window, &events);
    let renderer = state.renderer.clone();
    let frames: Vec<Frame> = tokio::task::spawn_blocking(move || {
        samples
            .into_iter()
            .enumerate()
            .map(|(i, (_, game_state))| {
                renderer.render(&game_state, u32::try_from(i).unwrap_or(u32::MAX))
            })
            .collect()
    })
    .await
    .map_err(|e| ApiError::Internal(format!("render task failed: {e}")))?;

    Ok(state.encoder.encode(&frames, window.fps).await?)
}
