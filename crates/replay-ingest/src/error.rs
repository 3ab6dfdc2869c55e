//! Error types for event ingestion.

use replay_store::StoreError;

/// Errors that can occur while ingesting one event message.
///
/// Ingestion errors are isolated per event: the subscriber loop logs them
/// and moves on, so one malformed message never blocks subsequent valid
/// events for the same or other games.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The message body was not valid JSON.
    #[error("invalid event JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A required envelope field was missing or empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The event log rejected the append (sequence gap) or the backend
    /// failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A NATS connect or subscribe operation failed.
    #[error("NATS error: {0}")]
    Nats(String),
}
