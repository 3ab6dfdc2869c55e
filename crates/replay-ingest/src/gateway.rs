//! Validation and normalization of raw event messages.
//!
//! The upstream game service publishes JSON envelopes on subjects matching
//! `game.events.{game_id}`. The gateway validates the envelope, fills in
//! the game id from the subject when the body omits it, assigns or
//! verifies the sequence number, and forwards the event to the log.
//!
//! Delivery is at-least-once: a redelivered event lands as a silent
//! duplicate no-op in the store. A sequence gap is surfaced as an error
//! for the caller to log as a data-integrity warning; the event is not
//! stored and ingestion continues.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use replay_store::EventStore;
use replay_types::{AppendOutcome, GameEvent, GameId};
use serde::Deserialize;

use crate::error::IngestError;

/// Raw inbound event envelope as published on the bus.
///
/// Every field is optional at the parse stage so validation can name the
/// exact missing field instead of surfacing an opaque serde error.
#[derive(Debug, Deserialize)]
struct EventEnvelope {
    game_id: Option<GameId>,
    sequence_no: Option<u64>,
    event_type: Option<String>,
    #[serde(default)]
    payload: serde_json::Value,
    occurred_at: Option<DateTime<Utc>>,
}

/// Validates inbound event messages and appends them to the event log.
#[derive(Debug)]
pub struct IngestionGateway {
    store: Arc<EventStore>,
}

impl IngestionGateway {
    /// Create a gateway writing to the given store.
    #[must_use]
    pub fn new(store: Arc<EventStore>) -> Self {
        Self { store }
    }

    /// Validate one raw message and append it to the event log.
    ///
    /// The game id comes from the envelope body, falling back to the
    /// trailing subject token. A missing `sequence_no` is assigned as
    /// `last_known + 1`; a present one is verified by the store's strict
    /// append.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError`] for malformed JSON, missing required
    /// fields, a sequence gap, or a storage failure. None of these abort
    /// the ingestion stream.
    pub async fn ingest(
        &self,
        payload: &[u8],
        subject: &str,
    ) -> Result<AppendOutcome, IngestError> {
        let envelope: EventEnvelope = serde_json::from_slice(payload)?;

        let game_id = match envelope.game_id {
            Some(id) if !id.as_str().is_empty() => id,
            _ => game_id_from_subject(subject).ok_or(IngestError::MissingField("game_id"))?,
        };
        let event_type = match envelope.event_type {
            Some(t) if !t.is_empty() => t,
            _ => return Err(IngestError::MissingField("event_type")),
        };
        let occurred_at = envelope
            .occurred_at
            .ok_or(IngestError::MissingField("occurred_at"))?;

        let sequence_no = match envelope.sequence_no {
            Some(seq) => seq,
            None => self
                .store
                .last_sequence(&game_id)
                .await?
                .map_or(0, |s| s.saturating_add(1)),
        };

        // Unknown event types are accepted on purpose: schemas evolve
        // ahead of this service and the projector skips what it does not
        // know.
        let event = GameEvent {
            game_id,
            sequence_no,
            event_type,
            payload: envelope.payload,
            occurred_at,
        };
        Ok(self.store.append(event).await?)
    }
}

/// Extract the game id from a subject like `game.events.{game_id}`.
fn game_id_from_subject(subject: &str) -> Option<GameId> {
    subject
        .rsplit('.')
        .next()
        .filter(|token| !token.is_empty() && !token.contains('*') && *token != ">")
        .map(GameId::from)
}
