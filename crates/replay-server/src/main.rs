//! Replay service binary.
//!
//! Wires the event store, ingestion gateway, renderer, encoder, and HTTP
//! API into one process. Game events arrive over NATS and land in the
//! event log; replay requests arrive over HTTP and read from it.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from environment variables
//! 3. Build the event store backend (Postgres when `DATABASE_URL` is set,
//!    in-memory otherwise)
//! 4. Build the frame renderer and video encoder
//! 5. Connect to NATS and spawn the ingestion subscriber (HTTP-only mode
//!    when `NATS_URL` is unset)
//! 6. Start the HTTP server

mod config;
mod error;

use std::sync::Arc;

use replay_api::{AppState, RenderPool, ServerConfig, start_server};
use replay_ingest::{IngestionGateway, NatsClient, run_subscriber};
use replay_render::{EncoderConfig, FrameRenderer, RenderConfig, VideoEncoder};
use replay_store::{EventStore, PgEventStore};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::ReplayConfig;
use crate::error::StartupError;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any initialization step or the HTTP server fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("replay-server starting");

    // 2. Load configuration.
    let config = ReplayConfig::from_env()?;
    info!(
        video_width = config.video_width,
        video_height = config.video_height,
        game_width = config.game_width,
        game_height = config.game_height,
        render_workers = config.render_workers,
        render_queue = config.render_queue,
        encode_timeout_secs = config.encode_timeout.as_secs(),
        "configuration loaded"
    );

    // 3. Build the event store backend.
    let store = Arc::new(build_store(&config).await?);

    // 4. Build the frame renderer and video encoder.
    let renderer = FrameRenderer::new(RenderConfig {
        video_width: config.video_width,
        video_height: config.video_height,
        game_width: config.game_width,
        game_height: config.game_height,
        ..RenderConfig::default()
    })?;
    let encoder = VideoEncoder::new(EncoderConfig {
        ffmpeg_path: config.ffmpeg_path.clone(),
    });

    let state = Arc::new(AppState::new(
        Arc::clone(&store),
        renderer,
        encoder,
        RenderPool::new(config.render_workers, config.render_queue),
        config.encode_timeout,
    ));

    // 5. Connect to NATS and spawn the ingestion subscriber.
    if let Some(nats_url) = &config.nats_url {
        let nats = NatsClient::connect(nats_url).await?;
        let subscriber = nats.subscribe(&config.nats_subject).await?;
        let gateway = IngestionGateway::new(store);
        tokio::spawn(run_subscriber(subscriber, gateway));
        info!(subject = config.nats_subject, "ingestion subscriber running");
    } else {
        warn!("NATS_URL not set, running HTTP-only (no event ingestion)");
    }

    // 6. Start the HTTP server.
    let server_config = ServerConfig {
        host: config.http_host.clone(),
        port: config.http_port,
    };
    start_server(&server_config, state).await?;

    Ok(())
}

/// Select and initialize the event store backend.
async fn build_store(config: &ReplayConfig) -> Result<EventStore, StartupError> {
    match &config.database_url {
        Some(url) => {
            // connect() applies the idempotent schema itself.
            let pg = PgEventStore::connect(url).await?;
            info!("using Postgres event store");
            Ok(EventStore::Postgres(pg))
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory event store (events are not durable)");
            Ok(EventStore::in_memory())
        }
    }
}
