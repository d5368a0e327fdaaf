//! Message template row.

use responder_core::message_template::MessageTemplate;
use responder_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `message_templates` table.
#[derive(Debug, Clone, FromRow)]
pub struct MessageTemplateRow {
    pub id: DbId,
    pub outgoing_intent_id: DbId,
    pub name: String,
    pub conditions: String,
    pub message_markup: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<MessageTemplateRow> for MessageTemplate {
    fn from(row: MessageTemplateRow) -> Self {
        Self {
            id: row.id,
            outgoing_intent_id: row.outgoing_intent_id,
            name: row.name,
            conditions: row.conditions,
            message_markup: row.message_markup,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
