//! Video encoding via an external ffmpeg process.
//!
//! Frames are streamed to the encoder's stdin as raw RGB24 video in strict
//! order; the declared frame rate and dimensions are passed up front on the
//! command line. The encoder emits a fragmented MP4 on stdout so the whole
//! artifact is collected without touching the filesystem.
//!
//! Failure is atomic: a spawn error, broken pipe, nonzero exit, or a
//! dropped future (client disconnect, timeout) discards all partial output
//! and -- via `kill_on_drop` -- reaps the external process. A caller either
//! receives a complete artifact or an error, never a corrupt file.

use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::error::EncodeError;
use crate::renderer::Frame;

/// A complete encoded video.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoArtifact {
    /// The MP4 container bytes.
    pub data: Vec<u8>,
    /// Number of frames encoded.
    pub frame_count: u64,
    /// Playback duration in seconds (`frame_count / fps`).
    pub duration_secs: f64,
}

impl VideoArtifact {
    /// The well-formed zero-duration artifact for an empty frame sequence.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            data: Vec::new(),
            frame_count: 0,
            duration_secs: 0.0,
        }
    }
}

/// Configuration for the external encoder process.
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    /// Path to the ffmpeg binary.
    pub ffmpeg_path: String,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: String::from("ffmpeg"),
        }
    }
}

/// Encodes ordered frame sequences into MP4 artifacts.
#[derive(Debug, Clone, Default)]
pub struct VideoEncoder {
    config: EncoderConfig,
}

impl VideoEncoder {
    /// Create an encoder with the given configuration.
    #[must_use]
    pub const fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    /// Encode an ordered frame sequence at the given frame rate.
    ///
    /// Dimensions are taken from the first frame; every subsequent frame
    /// must match. An empty sequence short-circuits to
    /// [`VideoArtifact::empty`] without spawning the encoder.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError`] if the process cannot be spawned, a frame
    /// has mismatched dimensions, streaming fails, or the encoder exits
    /// with a failure status. No partial artifact is ever returned.
    #[allow(clippy::cast_precision_loss)]
    pub async fn encode(&self, frames: &[Frame], fps: u32) -> Result<VideoArtifact, EncodeError> {
        let Some(first) = frames.first() else {
            return Ok(VideoArtifact::empty());
        };
        let (width, height) = (first.width, first.height);
        let expected_len = (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(3);
        for frame in frames {
            if frame.width != width || frame.height != height || frame.data.len() != expected_len
            {
                return Err(EncodeError::MismatchedFrame { index: frame.index });
            }
        }

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args([
                "-hide_banner",
                "-loglevel",
                "error",
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgb24",
                "-s",
                &format!("{width}x{height}"),
                "-framerate",
                &fps.to_string(),
                "-i",
                "-",
                "-c:v",
                "libx264",
                "-pix_fmt",
                "yuv420p",
                "-preset",
                "medium",
                "-crf",
                "23",
                "-movflags",
                "frag_keyframe+empty_moov",
                "-f",
                "mp4",
                "pipe:1",
            ])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(EncodeError::Spawn)?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| EncodeError::Spawn(std::io::Error::other("stdin not captured")))?;

        // Feed frames from a separate task so the encoder's stdout is
        // drained concurrently; otherwise a large artifact deadlocks the
        // pipe.
        let payload: Vec<Vec<u8>> = frames.iter().map(|f| f.data.clone()).collect();
        let writer = tokio::spawn(async move {
            for data in &payload {
                stdin.write_all(data).await?;
            }
            stdin.shutdown().await?;
            Ok::<(), std::io::Error>(())
        });

        let output = child
            .wait_with_output()
            .await
            .map_err(EncodeError::Stream)?;
        let write_result = writer
            .await
            .map_err(|e| EncodeError::Stream(std::io::Error::other(e)))?;

        if !output.status.success() {
            return Err(EncodeError::Process {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        // A write failure with a clean exit still means frames were lost.
        write_result.map_err(EncodeError::Stream)?;

        let frame_count = frames.len() as u64;
        debug!(frame_count, fps, bytes = output.stdout.len(), "encoded video artifact");
        Ok(VideoArtifact {
            data: output.stdout,
            frame_count,
            duration_secs: frame_count as f64 / f64::from(fps.max(1)),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn frame(index: u32, width: u32, height: u32) -> Frame {
        Frame {
            index,
            timestamp: Utc::now(),
            width,
            height,
            data: vec![0_u8; (width as usize) * (height as usize) * 3],
        }
    }

    #[tokio::test]
    async fn zero_frames_yield_empty_artifact_without_spawning() {
        // A nonexistent binary proves the encoder is never spawned.
        let encoder = VideoEncoder::new(EncoderConfig {
            ffmpeg_path: String::from("/nonexistent/ffmpeg"),
        });
        let artifact = encoder.encode(&[], 30).await.unwrap();
        assert_eq!(artifact, VideoArtifact::empty());
        assert!((artifact.duration_secs - 0.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn missing_binary_is_a_spawn_error() {
        let encoder = VideoEncoder::new(EncoderConfig {
            ffmpeg_path: String::from("/nonexistent/ffmpeg"),
        });
        let err = encoder.encode(&[frame(0, 4, 4)], 30).await.unwrap_err();
        assert!(matches!(err, EncodeError::Spawn(_)));
    }

    #[tokio::test]
    async fn failing_encoder_discards_output() {
        // `false` exits nonzero without reading stdin; the result must be
        // an error, never a partial artifact.
        let encoder = VideoEncoder::new(EncoderConfig {
            ffmpeg_path: String::from("false"),
        });
        let result = encoder.encode(&[frame(0, 4, 4)], 30).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn mismatched_frame_dimensions_are_rejected() {
        let encoder = VideoEncoder::default();
        let frames = vec![frame(0, 4, 4), frame(1, 8, 8)];
        let err = encoder.encode(&frames, 30).await.unwrap_err();
        assert!(matches!(err, EncodeError::MismatchedFrame { index: 1 }));
    }

    #[tokio::test]
    #[ignore = "requires ffmpeg on PATH"]
    async fn real_ffmpeg_produces_an_mp4() {
        let encoder = VideoEncoder::default();
        let frames: Vec<Frame> = (0..10).map(|i| frame(i, 16, 16)).collect();
        let artifact = encoder.encode(&frames, 10).await.unwrap();
        assert_eq!(artifact.frame_count, 10);
        assert!(!artifact.data.is_empty());
        // Fragmented MP4s start with an ftyp box.
        assert_eq!(&artifact.data[4..8], b"ftyp");
    }
}
