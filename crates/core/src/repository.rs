//! Storage interfaces used by the template store and restore service.
//!
//! Implemented by the in-memory backend in [`crate::memory`] and by the
//! PostgreSQL backend in `responder_db`. All methods are object safe so the
//! services can hold an `Arc<dyn TemplateRepository>`.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::message_template::{MessageTemplate, TemplateCandidate, VersionSnapshot};
use crate::outgoing_intent::{CreateOutgoingIntent, OutgoingIntent};
use crate::paging::PageRequest;
use crate::types::DbId;

/// Current-state table of message templates plus their version log.
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    /// Whether an outgoing intent with this id exists.
    async fn intent_exists(&self, intent_id: DbId) -> Result<bool, CoreError>;

    async fn find_template(&self, id: DbId) -> Result<Option<MessageTemplate>, CoreError>;

    /// Find a template only if it belongs to `intent_id`.
    async fn find_template_in_intent(
        &self,
        intent_id: DbId,
        id: DbId,
    ) -> Result<Option<MessageTemplate>, CoreError>;

    /// Whether any current template other than `exclude_id` uses `name`.
    async fn name_in_use(&self, name: &str, exclude_id: Option<DbId>) -> Result<bool, CoreError>;

    /// Templates of one intent in insertion order.
    async fn list_templates(
        &self,
        intent_id: DbId,
        page: PageRequest,
    ) -> Result<Vec<MessageTemplate>, CoreError>;

    async fn count_templates(&self) -> Result<i64, CoreError>;

    /// Insert a new template and append its first snapshot as one atomic unit.
    async fn insert_with_snapshot(
        &self,
        candidate: &TemplateCandidate,
    ) -> Result<(MessageTemplate, VersionSnapshot), CoreError>;

    /// Overwrite an existing template and append a snapshot as one atomic unit.
    ///
    /// Returns `None` (and writes nothing) if the template no longer exists.
    async fn update_with_snapshot(
        &self,
        candidate: &TemplateCandidate,
    ) -> Result<Option<(MessageTemplate, VersionSnapshot)>, CoreError>;

    /// Delete a template, optionally only if it belongs to `intent_id`.
    /// Snapshots are kept. Returns `true` if a row was removed.
    async fn delete_template(&self, id: DbId, intent_id: Option<DbId>) -> Result<bool, CoreError>;

    /// Exact lookup of one snapshot by subject and snapshot id.
    async fn find_snapshot(
        &self,
        subject_id: DbId,
        snapshot_id: DbId,
    ) -> Result<Option<VersionSnapshot>, CoreError>;

    async fn latest_snapshot(&self, subject_id: DbId)
        -> Result<Option<VersionSnapshot>, CoreError>;

    /// All snapshots of a subject, newest first.
    async fn list_snapshots(&self, subject_id: DbId) -> Result<Vec<VersionSnapshot>, CoreError>;

    async fn count_snapshots(&self, subject_id: DbId) -> Result<i64, CoreError>;

    /// Check that the backing store answers.
    async fn health_check(&self) -> Result<(), CoreError> {
        Ok(())
    }
}

/// Outgoing intents, the parents that templates are created under.
#[async_trait]
pub trait OutgoingIntentRepository: Send + Sync {
    async fn create_intent(&self, input: &CreateOutgoingIntent)
        -> Result<OutgoingIntent, CoreError>;

    async fn find_intent(&self, id: DbId) -> Result<Option<OutgoingIntent>, CoreError>;

    async fn list_intents(&self, page: PageRequest) -> Result<Vec<OutgoingIntent>, CoreError>;
}
