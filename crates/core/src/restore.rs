//! Restoring a template to one of its recorded versions.
//!
//! A restore copies a snapshot's versioned fields (`conditions` and
//! `message_markup`) onto the current record and commits the result through
//! the same validate-then-persist path as an update, so the restore itself
//! becomes a new version. Name and parent are never touched.

use crate::error::CoreError;
use crate::template_store::{CommittedTemplate, TemplateStore, TEMPLATE_ENTITY};
use crate::types::DbId;

pub const VERSION_NOT_FOUND_MESSAGE: &str = "Could not find a previous version for restoration.";

#[derive(Clone)]
pub struct RestoreService {
    store: TemplateStore,
}

impl RestoreService {
    pub fn new(store: TemplateStore) -> Self {
        Self { store }
    }

    /// Restore template `id` to snapshot `version_id`.
    ///
    /// - `NotFound` if the template does not exist.
    /// - `RestorationFailed` if the snapshot does not exist for this template.
    /// - `Validation` if the restored record no longer passes the rules; the
    ///   current state is left as it was.
    pub async fn restore(
        &self,
        id: DbId,
        version_id: DbId,
    ) -> Result<CommittedTemplate, CoreError> {
        let repository = self.store.repository();
        let not_found = || CoreError::NotFound {
            entity: TEMPLATE_ENTITY,
            id,
        };

        let current = repository.find_template(id).await?.ok_or_else(not_found)?;
        let snapshot = repository
            .find_snapshot(id, version_id)
            .await?
            .ok_or_else(|| CoreError::RestorationFailed(VERSION_NOT_FOUND_MESSAGE.to_string()))?;

        let candidate = current.to_candidate().with_properties(&snapshot.properties);
        self.store.commit(candidate).await?.ok_or_else(not_found)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
