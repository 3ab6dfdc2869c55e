//! Replay API server.
//!
//! This crate provides the Axum HTTP server that exposes:
//!
//! - **`GET /replays/{game_id}/states`** -- ordered point-in-time game
//!   states for a time window
//! - **`GET /replays/{game_id}/video`** -- an MP4 replay rendered at a
//!   requested fps and speed multiplier
//! - **`GET /health`** -- liveness probe
//!
//! # Architecture
//!
//! Handlers read committed events from the shared event log, project and
//! sample them with `replay-core`, rasterize frames with `replay-render`,
//! and stream them through the external encoder. Render/encode work runs
//! under a bounded worker pool with a bounded wait queue (saturation is a
//! 429, never unbounded memory growth) and a per-request timeout budget.
//! Client disconnects drop the in-flight future, which kills the encoder
//! process.

pub mod error;
pub mod handlers;
pub mod pool;
pub mod router;
pub mod server;
pub mod state;

// Re-export primary types for convenience.
pub use error::ApiError;
pub use pool::{PoolError, RenderPool};
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::{AppState, DEFAULT_ENCODE_TIMEOUT};
