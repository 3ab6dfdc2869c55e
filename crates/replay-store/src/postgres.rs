//! `PostgreSQL` event log backend.
//!
//! The `game_events` table carries a uniqueness constraint on
//! `(game_id, sequence_no)` and an index on `(game_id, occurred_at)` for
//! range queries. Queries use runtime types rather than compile-time
//! checked macros to avoid requiring a live database during builds.
//!
//! Per-game write serialization is the ingestion layer's job (one
//! subscriber task appends per game); the `ON CONFLICT DO NOTHING` insert
//! keeps a racing duplicate a no-op rather than an error.

use chrono::{DateTime, Utc};
use replay_types::{AppendOutcome, GameEvent, GameId};
use sqlx::PgPool;

use crate::error::StoreError;

/// Schema for the event log table. Applied idempotently at startup.
const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS game_events (
    game_id     TEXT        NOT NULL,
    sequence_no BIGINT      NOT NULL,
    event_type  TEXT        NOT NULL,
    payload     JSONB       NOT NULL,
    occurred_at TIMESTAMPTZ NOT NULL,
    PRIMARY KEY (game_id, sequence_no)
);
CREATE INDEX IF NOT EXISTS idx_game_events_occurred
    ON game_events (game_id, occurred_at);
";

/// A row from the `game_events` table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct EventRow {
    game_id: String,
    sequence_no: i64,
    event_type: String,
    payload: serde_json::Value,
    occurred_at: DateTime<Utc>,
}

impl From<EventRow> for GameEvent {
    fn from(row: EventRow) -> Self {
        Self {
            game_id: GameId::new(row.game_id),
            sequence_no: u64::try_from(row.sequence_no).unwrap_or(0),
            event_type: row.event_type,
            payload: row.payload,
            occurred_at: row.occurred_at,
        }
    }
}

/// Event log operations backed by `PostgreSQL`.
#[derive(Debug, Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    /// Connect to `PostgreSQL` and ensure the event log schema exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] if the connection or schema
    /// statements fail.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url).await?;
        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Wrap an existing pool (used by tests).
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the idempotent schema statements.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] if a statement fails.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        tracing::debug!("game_events schema ensured");
        Ok(())
    }

    /// Append an event in strict sequence order.
    ///
    /// Same contract as the in-memory backend: only `last_known + 1` is
    /// accepted, a stored sequence number is a silent duplicate, a skip
    /// ahead is a [`StoreError::SequenceGap`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::SequenceGap`] on a gap or
    /// [`StoreError::Postgres`] on a database failure.
    pub async fn append(&self, event: GameEvent) -> Result<AppendOutcome, StoreError> {
        let expected = self
            .last_sequence(&event.game_id)
            .await?
            .map_or(0, |s| s.saturating_add(1));

        if event.sequence_no > expected {
            return Err(StoreError::SequenceGap {
                game_id: event.game_id,
                expected,
                got: event.sequence_no,
            });
        }
        if event.sequence_no < expected {
            return Ok(AppendOutcome::Duplicate);
        }

        let result = sqlx::query(
            r"INSERT INTO game_events (game_id, sequence_no, event_type, payload, occurred_at)
              VALUES ($1, $2, $3, $4, $5)
              ON CONFLICT (game_id, sequence_no) DO NOTHING",
        )
        .bind(event.game_id.as_str())
        .bind(i64::try_from(event.sequence_no).unwrap_or(i64::MAX))
        .bind(&event.event_type)
        .bind(&event.payload)
        .bind(event.occurred_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Lost a race with a concurrent duplicate delivery.
            Ok(AppendOutcome::Duplicate)
        } else {
            Ok(AppendOutcome::Accepted)
        }
    }

    /// Query events with `occurred_at` in `[from_time, to_time)`, ordered
    /// by `sequence_no`. Unknown games yield an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] if the query fails.
    pub async fn query(
        &self,
        game_id: &GameId,
        from_time: Option<DateTime<Utc>>,
        to_time: Option<DateTime<Utc>>,
    ) -> Result<Vec<GameEvent>, StoreError> {
        let rows = sqlx::query_as::<_, EventRow>(
            r"SELECT game_id, sequence_no, event_type, payload, occurred_at
              FROM game_events
              WHERE game_id = $1
                AND ($2::TIMESTAMPTZ IS NULL OR occurred_at >= $2)
                AND ($3::TIMESTAMPTZ IS NULL OR occurred_at < $3)
              ORDER BY sequence_no",
        )
        .bind(game_id.as_str())
        .bind(from_time)
        .bind(to_time)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(GameEvent::from).collect())
    }

    /// Earliest and latest `occurred_at` for a game.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] if the query fails.
    pub async fn bounds(
        &self,
        game_id: &GameId,
    ) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>, StoreError> {
        let row: (Option<DateTime<Utc>>, Option<DateTime<Utc>>) = sqlx::query_as(
            r"SELECT MIN(occurred_at), MAX(occurred_at)
              FROM game_events WHERE game_id = $1",
        )
        .bind(game_id.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(match row {
            (Some(first), Some(last)) => Some((first, last)),
            _ => None,
        })
    }

    /// The latest stored sequence number for a game, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] if the query fails.
    pub async fn last_sequence(&self, game_id: &GameId) -> Result<Option<u64>, StoreError> {
        let row: (Option<i64>,) =
            sqlx::query_as(r"SELECT MAX(sequence_no) FROM game_events WHERE game_id = $1")
                .bind(game_id.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(row.0.map(|s| u64::try_from(s).unwrap_or(0)))
    }
}
