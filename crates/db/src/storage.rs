//! [`PgStorage`]: the core repository traits over PostgreSQL.
//!
//! Each template write opens one transaction, writes the current-state row,
//! appends the snapshot and commits. Dropping the transaction on any error
//! rolls both back.

use async_trait::async_trait;
use responder_core::error::{CoreError, ValidationFailure};
use responder_core::message_template::{
    MessageTemplate, TemplateCandidate, VersionSnapshot, FIELD_NAME,
};
use responder_core::outgoing_intent::{CreateOutgoingIntent, OutgoingIntent};
use responder_core::paging::PageRequest;
use responder_core::repository::{OutgoingIntentRepository, TemplateRepository};
use responder_core::types::DbId;
use responder_core::validation::NAME_TAKEN_MESSAGE;

use crate::repositories::{MessageTemplateRepo, OutgoingIntentRepo, TemplateVersionRepo};
use crate::DbPool;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

const TEMPLATE_NAME_CONSTRAINT: &str = "uq_message_templates_name";
const INTENT_NAME_CONSTRAINT: &str = "uq_outgoing_intents_name";

/// PostgreSQL-backed storage for intents, templates and their version log.
#[derive(Debug, Clone)]
pub struct PgStorage {
    pool: DbPool,
}

impl PgStorage {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

/// The Postgres error code and constraint name, if `err` came from the server.
fn violation(err: &sqlx::Error) -> Option<(String, Option<String>)> {
    match err {
        sqlx::Error::Database(db_err) => Some((
            db_err.code()?.into_owned(),
            db_err.constraint().map(str::to_string),
        )),
        _ => None,
    }
}

/// Convert a sqlx error into the core error space.
///
/// A race on the template name unique index surfaces as the same validation
/// failure the pipeline would have reported.
fn storage_error(err: sqlx::Error) -> CoreError {
    if let Some((code, Some(constraint))) = violation(&err) {
        if code == UNIQUE_VIOLATION && constraint == TEMPLATE_NAME_CONSTRAINT {
            return ValidationFailure::new(FIELD_NAME, NAME_TAKEN_MESSAGE).into();
        }
    }
    tracing::error!(error = %err, "Database error");
    CoreError::Storage(err.to_string())
}

#[async_trait]
impl TemplateRepository for PgStorage {
    async fn intent_exists(&self, intent_id: DbId) -> Result<bool, CoreError> {
        OutgoingIntentRepo::exists(&self.pool, intent_id)
            .await
            .map_err(storage_error)
    }

    async fn find_template(&self, id: DbId) -> Result<Option<MessageTemplate>, CoreError> {
        let row = MessageTemplateRepo::find_by_id(&self.pool, id)
            .await
            .map_err(storage_error)?;
        Ok(row.map(Into::into))
    }

    async fn find_template_in_intent(
        &self,
        intent_id: DbId,
        id: DbId,
    ) -> Result<Option<MessageTemplate>, CoreError> {
        let row = MessageTemplateRepo::find_in_intent(&self.pool, intent_id, id)
            .await
            .map_err(storage_error)?;
        Ok(row.map(Into::into))
    }

    async fn name_in_use(&self, name: &str, exclude_id: Option<DbId>) -> Result<bool, CoreError> {
        MessageTemplateRepo::name_exists(&self.pool, name, exclude_id)
            .await
            .map_err(storage_error)
    }

    async fn list_templates(
        &self,
        intent_id: DbId,
        page: PageRequest,
    ) -> Result<Vec<MessageTemplate>, CoreError> {
        let rows =
            MessageTemplateRepo::list_for_intent(&self.pool, intent_id, page.limit(), page.offset())
                .await
                .map_err(storage_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count_templates(&self) -> Result<i64, CoreError> {
        MessageTemplateRepo::count(&self.pool)
            .await
            .map_err(storage_error)
    }

    async fn insert_with_snapshot(
        &self,
        candidate: &TemplateCandidate,
    ) -> Result<(MessageTemplate, VersionSnapshot), CoreError> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        let row = match MessageTemplateRepo::create(&mut *tx, candidate).await {
            Ok(row) => row,
            Err(err) => {
                if matches!(violation(&err), Some((code, _)) if code == FOREIGN_KEY_VIOLATION) {
                    return Err(CoreError::NotFound {
                        entity: "OutgoingIntent",
                        id: candidate.outgoing_intent_id,
                    });
                }
                return Err(storage_error(err));
            }
        };
        let template: MessageTemplate = row.into();
        let version = TemplateVersionRepo::append(&mut *tx, template.id, &template.properties())
            .await
            .map_err(storage_error)?;

        tx.commit().await.map_err(storage_error)?;
        Ok((template, version.into()))
    }

    async fn update_with_snapshot(
        &self,
        candidate: &TemplateCandidate,
    ) -> Result<Option<(MessageTemplate, VersionSnapshot)>, CoreError> {
        let Some(id) = candidate.id else {
            return Ok(None);
        };
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        let Some(row) = MessageTemplateRepo::update(&mut *tx, id, candidate)
            .await
            .map_err(storage_error)?
        else {
            return Ok(None);
        };
        let template: MessageTemplate = row.into();
        let version = TemplateVersionRepo::append(&mut *tx, template.id, &template.properties())
            .await
            .map_err(storage_error)?;

        tx.commit().await.map_err(storage_error)?;
        Ok(Some((template, version.into())))
    }

    async fn delete_template(&self, id: DbId, intent_id: Option<DbId>) -> Result<bool, CoreError> {
        MessageTemplateRepo::delete(&self.pool, id, intent_id)
            .await
            .map_err(storage_error)
    }

    async fn find_snapshot(
        &self,
        subject_id: DbId,
        snapshot_id: DbId,
    ) -> Result<Option<VersionSnapshot>, CoreError> {
        let row = TemplateVersionRepo::find(&self.pool, subject_id, snapshot_id)
            .await
            .map_err(storage_error)?;
        Ok(row.map(Into::into))
    }

    async fn latest_snapshot(
        &self,
        subject_id: DbId,
    ) -> Result<Option<VersionSnapshot>, CoreError> {
        let row = TemplateVersionRepo::latest(&self.pool, subject_id)
            .await
            .map_err(storage_error)?;
        Ok(row.map(Into::into))
    }

    async fn list_snapshots(&self, subject_id: DbId) -> Result<Vec<VersionSnapshot>, CoreError> {
        let rows = TemplateVersionRepo::list_for_template(&self.pool, subject_id)
            .await
            .map_err(storage_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count_snapshots(&self, subject_id: DbId) -> Result<i64, CoreError> {
        TemplateVersionRepo::count_for_template(&self.pool, subject_id)
            .await
            .map_err(storage_error)
    }

    async fn health_check(&self) -> Result<(), CoreError> {
        crate::health_check(&self.pool).await.map_err(storage_error)
    }
}

#[async_trait]
impl OutgoingIntentRepository for PgStorage {
    async fn create_intent(
        &self,
        input: &CreateOutgoingIntent,
    ) -> Result<OutgoingIntent, CoreError> {
        match OutgoingIntentRepo::create(&self.pool, input).await {
            Ok(row) => Ok(row.into()),
            Err(err) => match violation(&err) {
                Some((code, Some(constraint)))
                    if code == UNIQUE_VIOLATION && constraint == INTENT_NAME_CONSTRAINT =>
                {
                    Err(CoreError::Conflict(format!(
                        "Outgoing intent '{}' already exists",
                        input.name
                    )))
                }
                _ => Err(storage_error(err)),
            },
        }
    }

    async fn find_intent(&self, id: DbId) -> Result<Option<OutgoingIntent>, CoreError> {
        let row = OutgoingIntentRepo::find_by_id(&self.pool, id)
            .await
            .map_err(storage_error)?;
        Ok(row.map(Into::into))
    }

    async fn list_intents(&self, page: PageRequest) -> Result<Vec<OutgoingIntent>, CoreError> {
        let rows = OutgoingIntentRepo::list(&self.pool, page.limit(), page.offset())
            .await
            .map_err(storage_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
