//! Template store: validate, then persist and snapshot as one unit.
//!
//! Every write builds a [`TemplateCandidate`], runs it through the
//! [`ValidationPipeline`] and only then hands it to the repository's atomic
//! write, which stores the current state and appends a version snapshot
//! together. A rejected candidate never reaches the repository.

use std::sync::Arc;

use serde::Serialize;

use crate::conditions::ConditionExpressionValidator;
use crate::error::CoreError;
use crate::markup::MessageMarkupValidator;
use crate::message_template::{
    CreateMessageTemplate, MessageTemplate, MessageTemplateDetail, TemplateCandidate,
    UpdateMessageTemplate, VersionSnapshot,
};
use crate::paging::PageRequest;
use crate::repository::TemplateRepository;
use crate::types::DbId;
use crate::validation::ValidationPipeline;

pub const TEMPLATE_ENTITY: &str = "MessageTemplate";
pub const INTENT_ENTITY: &str = "OutgoingIntent";
pub const VERSION_ENTITY: &str = "MessageTemplateVersion";

/// The result of an accepted write: the new current state and the snapshot
/// recorded for it.
#[derive(Debug, Clone, Serialize)]
pub struct CommittedTemplate {
    #[serde(flatten)]
    pub template: MessageTemplate,
    pub version: VersionSnapshot,
}

impl From<(MessageTemplate, VersionSnapshot)> for CommittedTemplate {
    fn from((template, version): (MessageTemplate, VersionSnapshot)) -> Self {
        Self { template, version }
    }
}

/// Owns the current-state table through a [`TemplateRepository`].
#[derive(Clone)]
pub struct TemplateStore {
    repository: Arc<dyn TemplateRepository>,
    pipeline: ValidationPipeline,
}

impl TemplateStore {
    pub fn new(repository: Arc<dyn TemplateRepository>, pipeline: ValidationPipeline) -> Self {
        Self {
            repository,
            pipeline,
        }
    }

    /// A store using the standard rules with the bundled conditions and
    /// markup validators.
    pub fn with_default_rules(repository: Arc<dyn TemplateRepository>) -> Self {
        let pipeline = ValidationPipeline::standard(
            Arc::clone(&repository),
            Arc::new(ConditionExpressionValidator),
            Arc::new(MessageMarkupValidator),
        );
        Self::new(repository, pipeline)
    }

    pub fn repository(&self) -> &Arc<dyn TemplateRepository> {
        &self.repository
    }

    /// Create a template under `intent_id`.
    ///
    /// Fails with `NotFound` if the intent does not exist and with
    /// `Validation` if any rule rejects the input; neither writes anything.
    pub async fn create(
        &self,
        intent_id: DbId,
        input: &CreateMessageTemplate,
    ) -> Result<CommittedTemplate, CoreError> {
        if !self.repository.intent_exists(intent_id).await? {
            return Err(CoreError::NotFound {
                entity: INTENT_ENTITY,
                id: intent_id,
            });
        }

        let candidate = TemplateCandidate::new(intent_id, input);
        self.pipeline.ensure_valid(&candidate).await?;

        let committed = self.repository.insert_with_snapshot(&candidate).await?;
        Ok(committed.into())
    }

    /// Merge `patch` into template `id` and commit it.
    ///
    /// Returns `Ok(None)` without writing when no template has this id: an
    /// update of a missing template is a silent no-op, not an error.
    pub async fn update(
        &self,
        id: DbId,
        patch: &UpdateMessageTemplate,
    ) -> Result<Option<CommittedTemplate>, CoreError> {
        let current = self.repository.find_template(id).await?;
        self.update_existing(current, patch).await
    }

    /// Like [`Self::update`], but a template owned by another intent counts as missing.
    pub async fn update_in_intent(
        &self,
        intent_id: DbId,
        id: DbId,
        patch: &UpdateMessageTemplate,
    ) -> Result<Option<CommittedTemplate>, CoreError> {
        let current = self
            .repository
            .find_template_in_intent(intent_id, id)
            .await?;
        self.update_existing(current, patch).await
    }

    async fn update_existing(
        &self,
        current: Option<MessageTemplate>,
        patch: &UpdateMessageTemplate,
    ) -> Result<Option<CommittedTemplate>, CoreError> {
        let Some(current) = current else {
            return Ok(None);
        };
        self.commit(current.to_candidate().apply(patch)).await
    }

    /// Validate an existing-record candidate and write it with a snapshot.
    ///
    /// `Ok(None)` means the record vanished before the write landed.
    pub(crate) async fn commit(
        &self,
        candidate: TemplateCandidate,
    ) -> Result<Option<CommittedTemplate>, CoreError> {
        self.pipeline.ensure_valid(&candidate).await?;
        let committed = self.repository.update_with_snapshot(&candidate).await?;
        Ok(committed.map(CommittedTemplate::from))
    }

    /// The current template together with its version metadata.
    pub async fn fetch(&self, id: DbId) -> Result<MessageTemplateDetail, CoreError> {
        let template = self
            .repository
            .find_template(id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: TEMPLATE_ENTITY,
                id,
            })?;
        let current_version = self.repository.latest_snapshot(id).await?;
        let history = self.repository.list_snapshots(id).await?;

        Ok(MessageTemplateDetail {
            template,
            current_version,
            history,
        })
    }

    /// Every snapshot of template `id`, newest first.
    ///
    /// The history of a deleted template stays readable; only an id that was
    /// never written is `NotFound`.
    pub async fn history(&self, id: DbId) -> Result<Vec<VersionSnapshot>, CoreError> {
        let history = self.repository.list_snapshots(id).await?;
        if history.is_empty() && self.repository.find_template(id).await?.is_none() {
            return Err(CoreError::NotFound {
                entity: TEMPLATE_ENTITY,
                id,
            });
        }
        Ok(history)
    }

    /// One snapshot of template `id`.
    pub async fn version(&self, id: DbId, version_id: DbId) -> Result<VersionSnapshot, CoreError> {
        self.repository
            .find_snapshot(id, version_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: VERSION_ENTITY,
                id: version_id,
            })
    }

    /// Remove template `id` if present. Its snapshots are kept.
    pub async fn delete(&self, id: DbId) -> Result<bool, CoreError> {
        self.repository.delete_template(id, None).await
    }

    /// Remove template `id` only if it belongs to `intent_id`.
    pub async fn delete_in_intent(&self, intent_id: DbId, id: DbId) -> Result<bool, CoreError> {
        self.repository.delete_template(id, Some(intent_id)).await
    }

    /// One page of an intent's templates in insertion order.
    pub async fn list(
        &self,
        intent_id: DbId,
        page: PageRequest,
    ) -> Result<Vec<MessageTemplate>, CoreError> {
        self.repository.list_templates(intent_id, page).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
