//! Repository for the `message_template_versions` table.
//!
//! The log is append-only: there is no update or delete here.

use responder_core::message_template::VersionProperties;
use responder_core::types::DbId;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use crate::models::template_version::TemplateVersionRow;

/// Column list for message_template_versions queries.
const COLUMNS: &str = "id, template_id, properties, created_at";

pub struct TemplateVersionRepo;

impl TemplateVersionRepo {
    /// Append a snapshot. Called on the transaction that wrote the template.
    pub async fn append(
        conn: &mut PgConnection,
        template_id: DbId,
        properties: &VersionProperties,
    ) -> Result<TemplateVersionRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO message_template_versions (template_id, properties)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TemplateVersionRow>(&query)
            .bind(template_id)
            .bind(Json(properties))
            .fetch_one(conn)
            .await
    }

    /// Exact lookup on both the template id and the version id.
    pub async fn find(
        pool: &PgPool,
        template_id: DbId,
        version_id: DbId,
    ) -> Result<Option<TemplateVersionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM message_template_versions
             WHERE id = $1 AND template_id = $2"
        );
        sqlx::query_as::<_, TemplateVersionRow>(&query)
            .bind(version_id)
            .bind(template_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn latest(
        pool: &PgPool,
        template_id: DbId,
    ) -> Result<Option<TemplateVersionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM message_template_versions
             WHERE template_id = $1
             ORDER BY id DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, TemplateVersionRow>(&query)
            .bind(template_id)
            .fetch_optional(pool)
            .await
    }

    /// All versions of a template, newest first.
    pub async fn list_for_template(
        pool: &PgPool,
        template_id: DbId,
    ) -> Result<Vec<TemplateVersionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM message_template_versions
             WHERE template_id = $1
             ORDER BY id DESC"
        );
        sqlx::query_as::<_, TemplateVersionRow>(&query)
            .bind(template_id)
            .fetch_all(pool)
            .await
    }

    pub async fn count_for_template(pool: &PgPool, template_id: DbId) -> Result<i64, sqlx::Error> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM message_template_versions WHERE template_id = $1")
                .bind(template_id)
                .fetch_one(pool)
                .await?;
        Ok(row.0)
    }
}
