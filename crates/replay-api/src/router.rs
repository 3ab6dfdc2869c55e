//! Axum router construction for the replay API.
//!
//! Assembles all routes into a single [`Router`] with CORS middleware
//! enabled for cross-origin dashboard access.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router for the replay server.
///
/// The router includes:
/// - `GET /health` -- liveness probe
/// - `GET /replays/{game_id}/states` -- ordered game states in a window
/// - `GET /replays/{game_id}/video` -- MP4 replay of a window
///
/// CORS is configured to allow any origin for development. In
/// production this should be restricted.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/replays/{game_id}/states", get(handlers::get_states))
        .route("/replays/{game_id}/video", get(handlers::get_video))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
