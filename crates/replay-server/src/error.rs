//! Startup error type for the replay server binary.

/// Errors that can occur while bringing the replay server up.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// Configuration is invalid or missing.
    #[error("config error: {0}")]
    Config(String),

    /// Renderer construction rejected the configured dimensions.
    #[error("render config error: {0}")]
    Render(#[from] replay_render::RenderConfigError),

    /// The event store backend could not be initialized.
    #[error("store error: {0}")]
    Store(#[from] replay_store::StoreError),

    /// NATS connection or subscription failed.
    #[error("ingestion error: {0}")]
    Ingest(#[from] replay_ingest::IngestError),

    /// The HTTP server failed to bind or serve.
    #[error("server error: {0}")]
    Server(#[from] replay_api::ServerError),
}
