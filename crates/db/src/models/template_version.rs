//! Version log row for `message_template_versions`.
//!
//! The versioned fields are stored as one JSONB document so the log does not
//! need a schema change when the set of versioned fields grows.

use responder_core::message_template::{VersionProperties, VersionSnapshot};
use responder_core::types::{DbId, Timestamp};
use sqlx::types::Json;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct TemplateVersionRow {
    pub id: DbId,
    pub template_id: DbId,
    pub properties: Json<VersionProperties>,
    pub created_at: Timestamp,
}

impl From<TemplateVersionRow> for VersionSnapshot {
    fn from(row: TemplateVersionRow) -> Self {
        Self {
            id: row.id,
            subject_id: row.template_id,
            properties: row.properties.0,
            created_at: row.created_at,
        }
    }
}
