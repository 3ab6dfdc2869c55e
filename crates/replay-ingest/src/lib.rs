//! Event ingestion for the replay service.
//!
//! The write path: NATS messages from the game service flow through the
//! [`IngestionGateway`] -- validation, normalization, sequence assignment
//! -- into the event log. Ingestion never blocks the read path; the two
//! share only the store.

pub mod error;
pub mod gateway;
pub mod nats;

pub use error::IngestError;
pub use gateway::IngestionGateway;
pub use nats::{NatsClient, run_subscriber};
