//! Integration tests for the replay API endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. This validates handler logic and routing
//! without needing a live network connection, a database, or ffmpeg.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, TimeZone, Utc};
use replay_api::{AppState, RenderPool, build_router};
use replay_render::{EncoderConfig, FrameRenderer, RenderConfig, VideoEncoder};
use replay_store::EventStore;
use replay_types::{GameEvent, GameId, event_types};
use serde_json::Value;
use tower::ServiceExt;

fn ts(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis).single().unwrap()
}

fn score_event(seq: u64, at: i64, delta: i64) -> GameEvent {
    GameEvent {
        game_id: GameId::new("g1"),
        sequence_no: seq,
        event_type: event_types::SCORE_CHANGED.to_owned(),
        payload: serde_json::json!({"delta": delta}),
        occurred_at: ts(at),
    }
}

/// App state over an in-memory store seeded with three score events at
/// t = 0s, 1s, 2s. The encoder points at a nonexistent binary so any test
/// that reaches a real encode fails loudly instead of depending on ffmpeg.
async fn make_test_state() -> Arc<AppState> {
    let store = Arc::new(EventStore::in_memory());
    for (seq, at, delta) in [(0, 0, 5), (1, 1_000, 7), (2, 2_000, -2)] {
        store.append(score_event(seq, at, delta)).await.unwrap();
    }

    let renderer = FrameRenderer::new(RenderConfig {
        video_width: 16,
        video_height: 16,
        game_width: 100.0,
        game_height: 100.0,
        ..RenderConfig::default()
    })
    .unwrap();
    let encoder = VideoEncoder::new(EncoderConfig {
        ffmpeg_path: String::from("/nonexistent/ffmpeg"),
    });

    Arc::new(AppState::new(
        store,
        renderer,
        encoder,
        RenderPool::new(2, 2),
        Duration::from_secs(5),
    ))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_health_returns_ok() {
    let router = build_router(make_test_state().await);
    let response = router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_states_returns_one_state_per_event() {
    let router = build_router(make_test_state().await);
    let response = router
        .oneshot(
            Request::get("/replays/g1/states")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    let states = json.as_array().unwrap();
    assert_eq!(states.len(), 3);
    // Cumulative scores: 5, 12, 10.
    assert_eq!(states[0]["score"], 5);
    assert_eq!(states[1]["score"], 12);
    assert_eq!(states[2]["score"], 10);
}

#[tokio::test]
async fn test_states_window_is_inclusive_exclusive() {
    let router = build_router(make_test_state().await);
    let response = router
        .oneshot(
            Request::get(
                "/replays/g1/states?from_time=1970-01-01T00:00:01Z&to_time=1970-01-01T00:00:02Z",
            )
            .body(Body::empty())
            .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    let states = json.as_array().unwrap();
    // Only the t=1s event is inside [1s, 2s), seeded by the t=0s event.
    assert_eq!(states.len(), 1);
    assert_eq!(states[0]["score"], 12);
}

#[tokio::test]
async fn test_states_unknown_game_is_empty_list() {
    let router = build_router(make_test_state().await);
    let response = router
        .oneshot(
            Request::get("/replays/never-played/states")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_states_inverted_window_is_bad_request() {
    let router = build_router(make_test_state().await);
    let response = router
        .oneshot(
            Request::get(
                "/replays/g1/states?from_time=1970-01-01T00:00:02Z&to_time=1970-01-01T00:00:01Z",
            )
            .body(Body::empty())
            .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_video_unknown_game_is_not_found() {
    let router = build_router(make_test_state().await);
    let response = router
        .oneshot(
            Request::get("/replays/never-played/video")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], 404);
}

#[tokio::test]
async fn test_video_rejects_invalid_parameters() {
    let state = make_test_state().await;

    let response = build_router(Arc::clone(&state))
        .oneshot(
            Request::get("/replays/g1/video?fps=0")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = build_router(state)
        .oneshot(
            Request::get("/replays/g1/video?speed=-2.0")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_video_century_window_clamps_to_game_bounds() {
    let router = build_router(make_test_state().await);
    // A 200-year explicit window over a two-second game clamps to the
    // game's event bounds instead of sampling billions of frames. The
    // clamped render reaches the (nonexistent) encoder and surfaces as a
    // 502 rather than exhausting memory.
    let response = router
        .oneshot(
            Request::get(
                "/replays/g1/video?from_time=1970-01-01T00:00:00Z&to_time=2170-01-01T00:00:00Z&fps=60",
            )
            .body(Body::empty())
            .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_video_excessive_frame_demand_is_bad_request() {
    let router = build_router(make_test_state().await);
    // A degenerate speed multiplier demands unbounded frames even inside
    // the event bounds; the frame-count cap rejects it up front.
    let response = router
        .oneshot(
            Request::get("/replays/g1/video?speed=0.0000000001")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_video_empty_window_is_empty_artifact_not_error() {
    let router = build_router(make_test_state().await);
    // from == to: zero frames, the encoder is never spawned, so the
    // nonexistent ffmpeg path cannot fail this request.
    let response = router
        .oneshot(
            Request::get(
                "/replays/g1/video?from_time=1970-01-01T00:00:01Z&to_time=1970-01-01T00:00:01Z",
            )
            .body(Body::empty())
            .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "video/mp4"
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn test_video_encoder_failure_is_bad_gateway() {
    let router = build_router(make_test_state().await);
    // Non-empty window with the nonexistent encoder binary: the spawn
    // failure surfaces as a 502, never a partial artifact.
    let response = router
        .oneshot(
            Request::get("/replays/g1/video?fps=5")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], 502);
}

#[tokio::test]
async fn test_video_saturated_pool_is_too_many_requests() {
    let store = Arc::new(EventStore::in_memory());
    store.append(score_event(0, 0, 1)).await.unwrap();
    store.append(score_event(1, 1_000, 1)).await.unwrap();

    let state = Arc::new(AppState::new(
        store,
        FrameRenderer::new(RenderConfig::default()).unwrap(),
        VideoEncoder::new(EncoderConfig {
            ffmpeg_path: String::from("/nonexistent/ffmpeg"),
        }),
        // No workers, no queue: every request is rejected up front.
        RenderPool::new(0, 0),
        Duration::from_secs(5),
    ));

    let response = build_router(state)
        .oneshot(
            Request::get("/replays/g1/video")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers().get("retry-after").unwrap(), "1");
}
