//! Configuration for the replay server binary.
//!
//! All configuration is loaded from environment variables. The server needs
//! the video and game-world dimensions up front (they shape every rendered
//! frame), and optionally a NATS server for ingestion and a Postgres URL
//! for durable event storage.

use std::time::Duration;

use crate::error::StartupError;

/// Complete server configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Output video width in pixels.
    pub video_width: u32,
    /// Output video height in pixels.
    pub video_height: u32,
    /// Game world width in game units.
    pub game_width: f64,
    /// Game world height in game units.
    pub game_height: f64,
    /// NATS server URL; when absent the server runs HTTP-only.
    pub nats_url: Option<String>,
    /// NATS subject pattern for game event envelopes.
    pub nats_subject: String,
    /// Postgres connection string; when absent events live in memory.
    pub database_url: Option<String>,
    /// HTTP bind host.
    pub http_host: String,
    /// HTTP bind port.
    pub http_port: u16,
    /// Number of concurrent render/encode workers.
    pub render_workers: usize,
    /// Maximum requests allowed to wait for a render worker.
    pub render_queue: usize,
    /// Per-request render/encode timeout budget.
    pub encode_timeout: Duration,
    /// Path to the ffmpeg binary.
    pub ffmpeg_path: String,
}

impl ReplayConfig {
    /// Load configuration from environment variables.
    ///
    /// Required variables:
    /// - `REPLAY_VIDEO_WIDTH` / `REPLAY_VIDEO_HEIGHT` -- output pixel size
    /// - `REPLAY_GAME_WIDTH` / `REPLAY_GAME_HEIGHT` -- game world extent
    ///
    /// Optional variables:
    /// - `NATS_URL` -- NATS connection string (HTTP-only mode when unset)
    /// - `NATS_SUBJECT` -- event subject pattern (default `game.events.*`)
    /// - `DATABASE_URL` -- Postgres connection string (memory store when unset)
    /// - `HTTP_HOST` -- bind host (default `0.0.0.0`)
    /// - `HTTP_PORT` -- bind port (default `8080`)
    /// - `RENDER_WORKERS` -- concurrent render jobs (default 2)
    /// - `RENDER_QUEUE` -- max queued render requests (default 8)
    /// - `ENCODE_TIMEOUT_SECS` -- per-request encode budget (default 120)
    /// - `FFMPEG_PATH` -- encoder binary (default `ffmpeg`)
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::Config`] if a required variable is missing
    /// or any variable fails to parse.
    pub fn from_env() -> Result<Self, StartupError> {
        let video_width: u32 = parse_env_var(&env_var("REPLAY_VIDEO_WIDTH")?, "REPLAY_VIDEO_WIDTH")?;
        let video_height: u32 =
            parse_env_var(&env_var("REPLAY_VIDEO_HEIGHT")?, "REPLAY_VIDEO_HEIGHT")?;
        let game_width: f64 = parse_env_var(&env_var("REPLAY_GAME_WIDTH")?, "REPLAY_GAME_WIDTH")?;
        let game_height: f64 =
            parse_env_var(&env_var("REPLAY_GAME_HEIGHT")?, "REPLAY_GAME_HEIGHT")?;

        let nats_url = std::env::var("NATS_URL").ok();
        let nats_subject =
            std::env::var("NATS_SUBJECT").unwrap_or_else(|_| "game.events.*".to_owned());
        let database_url = std::env::var("DATABASE_URL").ok();

        let http_host = std::env::var("HTTP_HOST").unwrap_or_else(|_| "0.0.0.0".to_owned());
        let http_port: u16 = parse_env_var(
            &std::env::var("HTTP_PORT").unwrap_or_else(|_| "8080".to_owned()),
            "HTTP_PORT",
        )?;

        let render_workers: usize = parse_env_var(
            &std::env::var("RENDER_WORKERS").unwrap_or_else(|_| "2".to_owned()),
            "RENDER_WORKERS",
        )?;
        let render_queue: usize = parse_env_var(
            &std::env::var("RENDER_QUEUE").unwrap_or_else(|_| "8".to_owned()),
            "RENDER_QUEUE",
        )?;
        let encode_timeout_secs: u64 = parse_env_var(
            &std::env::var("ENCODE_TIMEOUT_SECS").unwrap_or_else(|_| "120".to_owned()),
            "ENCODE_TIMEOUT_SECS",
        )?;
        let ffmpeg_path = std::env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_owned());

        Ok(Self {
            video_width,
            video_height,
            game_width,
            game_height,
            nats_url,
            nats_subject,
            database_url,
            http_host,
            http_port,
            render_workers,
            render_queue,
            encode_timeout: Duration::from_secs(encode_timeout_secs),
            ffmpeg_path,
        })
    }
}

/// Read a required environment variable.
fn env_var(name: &str) -> Result<String, StartupError> {
    std::env::var(name)
        .map_err(|e| StartupError::Config(format!("missing required env var {name}: {e}")))
}

/// Parse a variable's value, naming the variable in the error.
fn parse_env_var<T: std::str::FromStr>(value: &str, name: &str) -> Result<T, StartupError>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| StartupError::Config(format!("invalid {name}: {e}")))
}
