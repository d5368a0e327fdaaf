//! Repository for the `message_templates` table.
//!
//! Writes take a connection rather than the pool: they only ever run inside
//! the transaction that also appends the version snapshot.

use responder_core::message_template::TemplateCandidate;
use responder_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::message_template::MessageTemplateRow;

/// Column list for message_templates queries.
const COLUMNS: &str = "id, outgoing_intent_id, name, conditions, message_markup, \
    created_at, updated_at";

/// Provides CRUD operations for message templates.
pub struct MessageTemplateRepo;

impl MessageTemplateRepo {
    /// Insert a new template from a validated candidate. The candidate's `id`
    /// is ignored; the database assigns one.
    pub async fn create(
        conn: &mut PgConnection,
        candidate: &TemplateCandidate,
    ) -> Result<MessageTemplateRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO message_templates
                (outgoing_intent_id, name, conditions, message_markup)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MessageTemplateRow>(&query)
            .bind(candidate.outgoing_intent_id)
            .bind(&candidate.name)
            .bind(&candidate.conditions)
            .bind(&candidate.message_markup)
            .fetch_one(conn)
            .await
    }

    /// Overwrite the mutable fields of template `id`.
    /// Returns `None` if no row with that id exists.
    pub async fn update(
        conn: &mut PgConnection,
        id: DbId,
        candidate: &TemplateCandidate,
    ) -> Result<Option<MessageTemplateRow>, sqlx::Error> {
        let query = format!(
            "UPDATE message_templates SET
                name = $2,
                conditions = $3,
                message_markup = $4
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MessageTemplateRow>(&query)
            .bind(id)
            .bind(&candidate.name)
            .bind(&candidate.conditions)
            .bind(&candidate.message_markup)
            .fetch_optional(conn)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<MessageTemplateRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM message_templates WHERE id = $1");
        sqlx::query_as::<_, MessageTemplateRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a template only if it belongs to the given intent.
    pub async fn find_in_intent(
        pool: &PgPool,
        intent_id: DbId,
        id: DbId,
    ) -> Result<Option<MessageTemplateRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM message_templates
             WHERE id = $1 AND outgoing_intent_id = $2"
        );
        sqlx::query_as::<_, MessageTemplateRow>(&query)
            .bind(id)
            .bind(intent_id)
            .fetch_optional(pool)
            .await
    }

    /// Whether a template other than `exclude_id` already uses `name`.
    pub async fn name_exists(
        pool: &PgPool,
        name: &str,
        exclude_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS(
                SELECT 1 FROM message_templates
                WHERE name = $1 AND ($2::BIGINT IS NULL OR id <> $2)
             )",
        )
        .bind(name)
        .bind(exclude_id)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    /// List an intent's templates in insertion order.
    pub async fn list_for_intent(
        pool: &PgPool,
        intent_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<MessageTemplateRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM message_templates
             WHERE outgoing_intent_id = $1
             ORDER BY id
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, MessageTemplateRow>(&query)
            .bind(intent_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM message_templates")
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    /// Delete a template, optionally only if it belongs to `intent_id`.
    /// Returns `true` if a row was removed.
    pub async fn delete(
        pool: &PgPool,
        id: DbId,
        intent_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM message_templates
             WHERE id = $1 AND ($2::BIGINT IS NULL OR outgoing_intent_id = $2)",
        )
        .bind(id)
        .bind(intent_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
