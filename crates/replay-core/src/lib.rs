//! Projection and sampling core for the replay service.
//!
//! This crate is pure: it folds ordered event sequences into point-in-time
//! [`GameState`](replay_types::GameState) values (projection) and computes
//! the sample timestamps of a replay window (sampling). All I/O -- fetching
//! events, rendering, encoding -- lives in the surrounding crates.

pub mod error;
pub mod projector;
pub mod sampler;

pub use error::{ProjectionError, SampleError};
pub use projector::{ProjectionCursor, TransitionFn, TransitionTable, project, states_at_events};
pub use sampler::{MAX_FRAME_COUNT, ResolvedWindow, resolve_window, sample};
