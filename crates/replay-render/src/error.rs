//! Error types for rendering and encoding.

/// Errors raised while validating renderer configuration.
///
/// These are startup-fatal: a renderer with bad dimensions must never be
/// constructed, so requests can assume a valid scale transform.
#[derive(Debug, thiserror::Error)]
pub enum RenderConfigError {
    /// Output video dimensions must be at least 1x1.
    #[error("invalid video dimensions {width}x{height}")]
    InvalidVideoDims {
        /// Configured output width.
        width: u32,
        /// Configured output height.
        height: u32,
    },

    /// Game coordinate space must be positive and finite.
    #[error("invalid game dimensions {width}x{height}")]
    InvalidGameDims {
        /// Configured game-space width.
        width: f64,
        /// Configured game-space height.
        height: f64,
    },

    /// At least one player color is required.
    #[error("player palette is empty")]
    EmptyPalette,
}

/// Errors raised by the external video encoder.
///
/// Any failure discards the partial output: a caller never receives a
/// corrupt artifact.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// The encoder process could not be spawned.
    #[error("failed to spawn encoder process: {0}")]
    Spawn(#[source] std::io::Error),

    /// Streaming frames to the encoder's stdin failed.
    #[error("failed to stream frames to encoder: {0}")]
    Stream(#[source] std::io::Error),

    /// The encoder process exited with a failure status.
    #[error("encoder exited with status {code:?}: {stderr}")]
    Process {
        /// Process exit code, if the process exited normally.
        code: Option<i32>,
        /// Captured stderr output.
        stderr: String,
    },

    /// A frame's dimensions did not match the stream's declared dimensions.
    #[error("frame {index} has mismatched dimensions")]
    MismatchedFrame {
        /// Ordinal index of the offending frame.
        index: u32,
    },
}
