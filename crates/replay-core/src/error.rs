//! Error types for projection and sampling.

use chrono::{DateTime, Utc};

/// Errors raised by a transition function while applying one event.
///
/// Never fatal to a fold: the projector logs the event and skips it,
/// since a malformed payload must not abort an otherwise valid replay.
#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    /// The payload did not deserialize into the shape the event type
    /// requires.
    #[error("malformed payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Errors raised while validating replay window parameters.
#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    /// `fps` must be at least 1.
    #[error("fps must be at least 1")]
    InvalidFps,

    /// `speed` must be a positive finite number.
    #[error("speed must be a positive finite number, got {0}")]
    InvalidSpeed(f64),

    /// The window start lies after its end.
    #[error("window start {from} is after end {to}")]
    InvalidWindow {
        /// Window start.
        from: DateTime<Utc>,
        /// Window end.
        to: DateTime<Utc>,
    },

    /// The window would produce more frames than one request may render.
    #[error("window would produce {frames} frames, more than the {max} allowed")]
    WindowTooLarge {
        /// Frames the window would produce.
        frames: u64,
        /// The configured maximum.
        max: u64,
    },
}
