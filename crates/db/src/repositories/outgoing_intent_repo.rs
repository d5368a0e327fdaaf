//! Repository for the `outgoing_intents` table.

use responder_core::outgoing_intent::CreateOutgoingIntent;
use responder_core::types::DbId;
use sqlx::PgPool;

use crate::models::outgoing_intent::OutgoingIntentRow;

/// Column list for outgoing_intents queries.
const COLUMNS: &str = "id, name, created_at, updated_at";

/// Provides create and read operations for outgoing intents.
pub struct OutgoingIntentRepo;

impl OutgoingIntentRepo {
    /// Insert a new outgoing intent, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateOutgoingIntent,
    ) -> Result<OutgoingIntentRow, sqlx::Error> {
        let query = format!("INSERT INTO outgoing_intents (name) VALUES ($1) RETURNING {COLUMNS}");
        sqlx::query_as::<_, OutgoingIntentRow>(&query)
            .bind(&input.name)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<OutgoingIntentRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM outgoing_intents WHERE id = $1");
        sqlx::query_as::<_, OutgoingIntentRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn exists(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM outgoing_intents WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    /// List outgoing intents ordered by ID.
    pub async fn list(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<OutgoingIntentRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM outgoing_intents
             ORDER BY id
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, OutgoingIntentRow>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}
