//! Outgoing intent row.

use responder_core::outgoing_intent::OutgoingIntent;
use responder_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `outgoing_intents` table.
#[derive(Debug, Clone, FromRow)]
pub struct OutgoingIntentRow {
    pub id: DbId,
    pub name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<OutgoingIntentRow> for OutgoingIntent {
    fn from(row: OutgoingIntentRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
