//! Frame rendering and video encoding for the replay service.
//!
//! [`FrameRenderer`] turns a reconstructed game state into one fixed-size
//! RGB24 raster frame; [`VideoEncoder`] streams an ordered frame sequence
//! to an external ffmpeg process and collects the MP4 artifact. Both are
//! deterministic on the Rust side; the encoder owns the only external
//! process in the service.

pub mod encoder;
pub mod error;
pub mod renderer;

pub use encoder::{EncoderConfig, VideoArtifact, VideoEncoder};
pub use error::{EncodeError, RenderConfigError};
pub use renderer::{Color, Frame, FrameRenderer, RenderConfig};
