//! NATS subscription for the ingestion write path.
//!
//! The game service publishes event envelopes on subjects matching
//! `game.events.{game_id}`. One subscriber task consumes the stream and
//! hands each message to the [`IngestionGateway`]; because a single task
//! appends for all games and the store serializes per game, the
//! single-writer-per-game discipline holds without any global lock.

use std::sync::Arc;

use futures::StreamExt as _;
use replay_store::StoreError;
use tracing::{debug, info, warn};

use crate::error::IngestError;
use crate::gateway::IngestionGateway;

/// NATS client wrapper for the ingestion gateway.
#[derive(Debug, Clone)]
pub struct NatsClient {
    client: async_nats::Client,
}

impl NatsClient {
    /// Connect to a NATS server.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Nats`] if the connection cannot be
    /// established.
    pub async fn connect(url: &str) -> Result<Self, IngestError> {
        info!(url = url, "connecting to NATS server");
        let client = async_nats::connect(url)
            .await
            .map_err(|e| IngestError::Nats(format!("failed to connect to {url}: {e}")))?;
        info!("NATS connection established");
        Ok(Self { client })
    }

    /// Subscribe to the event subject pattern.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Nats`] if the subscription fails.
    pub async fn subscribe(&self, subject: &str) -> Result<async_nats::Subscriber, IngestError> {
        debug!(subject = subject, "subscribing to event subjects");
        let subscriber = self
            .client
            .subscribe(subject.to_owned())
            .await
            .map_err(|e| IngestError::Nats(format!("failed to subscribe to {subject}: {e}")))?;
        info!(subject = subject, "subscribed to event subjects");
        Ok(subscriber)
    }
}

/// Consume the subscription until the connection closes.
///
/// Every message is handled in isolation: validation failures and sequence
/// gaps are logged and the loop continues, so one bad event never stalls
/// ingestion for the same or other games.
pub async fn run_subscriber(mut subscriber: async_nats::Subscriber, gateway: IngestionGateway) {
    let gateway = Arc::new(gateway);
    while let Some(message) = subscriber.next().await {
        let subject = message.subject.as_str();
        match gateway.ingest(&message.payload, subject).await {
            Ok(replay_types::AppendOutcome::Accepted) => {
                debug!(subject = subject, "event accepted");
            }
            Ok(replay_types::AppendOutcome::Duplicate) => {
                debug!(subject = subject, "duplicate delivery ignored");
            }
            Err(IngestError::Store(StoreError::SequenceGap {
                game_id,
                expected,
                got,
            })) => {
                // Data-integrity warning, not fatal: the event is dropped
                // and the stream continues.
                warn!(
                    game_id = %game_id,
                    expected,
                    got,
                    "sequence gap detected, event dropped"
                );
            }
            Err(e) => {
                warn!(subject = subject, error = %e, "rejected event message");
            }
        }
    }
    info!("NATS subscription closed, ingestion stopped");
}
