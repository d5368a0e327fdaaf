//! In-process storage backend.
//!
//! Holds intents, templates and the version log behind a single
//! `tokio::sync::RwLock`, so a template write and its snapshot append happen
//! under one write guard and are never observable separately. Used when no
//! database is configured and throughout the test suites.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{CoreError, ValidationFailure};
use crate::message_template::{
    MessageTemplate, TemplateCandidate, VersionProperties, VersionSnapshot, FIELD_NAME,
};
use crate::outgoing_intent::{CreateOutgoingIntent, OutgoingIntent};
use crate::paging::PageRequest;
use crate::repository::{OutgoingIntentRepository, TemplateRepository};
use crate::types::{DbId, Timestamp};
use crate::validation::NAME_TAKEN_MESSAGE;

// ---------------------------------------------------------------------------
// Version log
// ---------------------------------------------------------------------------

/// Append-only list of snapshots. Ids start at 1 and never repeat.
#[derive(Debug, Default)]
pub struct InMemoryVersionLog {
    entries: Vec<VersionSnapshot>,
    last_id: DbId,
}

impl InMemoryVersionLog {
    pub fn append(
        &mut self,
        subject_id: DbId,
        properties: VersionProperties,
        at: Timestamp,
    ) -> VersionSnapshot {
        self.last_id += 1;
        let snapshot = VersionSnapshot {
            id: self.last_id,
            subject_id,
            properties,
            created_at: at,
        };
        self.entries.push(snapshot.clone());
        snapshot
    }

    /// Exact match on both ids.
    pub fn find(&self, subject_id: DbId, snapshot_id: DbId) -> Option<&VersionSnapshot> {
        self.entries
            .iter()
            .find(|s| s.id == snapshot_id && s.subject_id == subject_id)
    }

    pub fn latest(&self, subject_id: DbId) -> Option<&VersionSnapshot> {
        self.entries.iter().rev().find(|s| s.subject_id == subject_id)
    }

    /// Snapshots of one subject, newest first.
    pub fn for_subject(&self, subject_id: DbId) -> impl Iterator<Item = &VersionSnapshot> {
        self.entries
            .iter()
            .rev()
            .filter(move |s| s.subject_id == subject_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct State {
    intents: BTreeMap<DbId, OutgoingIntent>,
    last_intent_id: DbId,
    templates: BTreeMap<DbId, MessageTemplate>,
    last_template_id: DbId,
    versions: InMemoryVersionLog,
}

impl State {
    fn name_taken(&self, name: &str, exclude_id: Option<DbId>) -> bool {
        self.templates
            .values()
            .any(|t| t.name == name && Some(t.id) != exclude_id)
    }
}

/// Intents, templates and snapshots held in memory.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    state: RwLock<State>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of snapshots across all subjects.
    pub async fn snapshot_total(&self) -> usize {
        self.state.read().await.versions.len()
    }
}

fn name_taken_error() -> CoreError {
    ValidationFailure::new(FIELD_NAME, NAME_TAKEN_MESSAGE).into()
}

fn page_of<T>(items: impl Iterator<Item = T>, page: PageRequest) -> Vec<T> {
    items
        .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
        .take(usize::try_from(page.limit()).unwrap_or(0))
        .collect()
}

#[async_trait]
impl TemplateRepository for InMemoryStorage {
    async fn intent_exists(&self, intent_id: DbId) -> Result<bool, CoreError> {
        Ok(self.state.read().await.intents.contains_key(&intent_id))
    }

    async fn find_template(&self, id: DbId) -> Result<Option<MessageTemplate>, CoreError> {
        Ok(self.state.read().await.templates.get(&id).cloned())
    }

    async fn find_template_in_intent(
        &self,
        intent_id: DbId,
        id: DbId,
    ) -> Result<Option<MessageTemplate>, CoreError> {
        Ok(self
            .state
            .read()
            .await
            .templates
            .get(&id)
            .filter(|t| t.outgoing_intent_id == intent_id)
            .cloned())
    }

    async fn name_in_use(&self, name: &str, exclude_id: Option<DbId>) -> Result<bool, CoreError> {
        Ok(self.state.read().await.name_taken(name, exclude_id))
    }

    async fn list_templates(
        &self,
        intent_id: DbId,
        page: PageRequest,
    ) -> Result<Vec<MessageTemplate>, CoreError> {
        let state = self.state.read().await;
        let matching = state
            .templates
            .values()
            .filter(|t| t.outgoing_intent_id == intent_id)
            .cloned();
        Ok(page_of(matching, page))
    }

    async fn count_templates(&self) -> Result<i64, CoreError> {
        Ok(self.state.read().await.templates.len() as i64)
    }

    async fn insert_with_snapshot(
        &self,
        candidate: &TemplateCandidate,
    ) -> Result<(MessageTemplate, VersionSnapshot), CoreError> {
        let mut state = self.state.write().await;

        if !state.intents.contains_key(&candidate.outgoing_intent_id) {
            return Err(CoreError::NotFound {
                entity: "OutgoingIntent",
                id: candidate.outgoing_intent_id,
            });
        }
        if state.name_taken(&candidate.name, None) {
            return Err(name_taken_error());
        }

        let now = chrono::Utc::now();
        state.last_template_id += 1;
        let template = MessageTemplate {
            id: state.last_template_id,
            outgoing_intent_id: candidate.outgoing_intent_id,
            name: candidate.name.clone(),
            conditions: candidate.conditions.clone(),
            message_markup: candidate.message_markup.clone(),
            created_at: now,
            updated_at: now,
        };
        state.templates.insert(template.id, template.clone());
        let snapshot = state
            .versions
            .append(template.id, template.properties(), now);

        Ok((template, snapshot))
    }

    async fn update_with_snapshot(
        &self,
        candidate: &TemplateCandidate,
    ) -> Result<Option<(MessageTemplate, VersionSnapshot)>, CoreError> {
        let Some(id) = candidate.id else {
            return Ok(None);
        };
        let mut state = self.state.write().await;

        if !state.templates.contains_key(&id) {
            return Ok(None);
        }
        if state.name_taken(&candidate.name, Some(id)) {
            return Err(name_taken_error());
        }

        let now = chrono::Utc::now();
        let template = {
            let Some(current) = state.templates.get_mut(&id) else {
                return Ok(None);
            };
            current.name = candidate.name.clone();
            current.conditions = candidate.conditions.clone();
            current.message_markup = candidate.message_markup.clone();
            current.updated_at = now;
            current.clone()
        };
        let snapshot = state.versions.append(id, template.properties(), now);

        Ok(Some((template, snapshot)))
    }

    async fn delete_template(&self, id: DbId, intent_id: Option<DbId>) -> Result<bool, CoreError> {
        let mut state = self.state.write().await;
        let belongs = match state.templates.get(&id) {
            Some(t) => intent_id.map_or(true, |intent| t.outgoing_intent_id == intent),
            None => false,
        };
        if belongs {
            state.templates.remove(&id);
        }
        Ok(belongs)
    }

    async fn find_snapshot(
        &self,
        subject_id: DbId,
        snapshot_id: DbId,
    ) -> Result<Option<VersionSnapshot>, CoreError> {
        Ok(self
            .state
            .read()
            .await
            .versions
            .find(subject_id, snapshot_id)
            .cloned())
    }

    async fn latest_snapshot(
        &self,
        subject_id: DbId,
    ) -> Result<Option<VersionSnapshot>, CoreError> {
        Ok(self.state.read().await.versions.latest(subject_id).cloned())
    }

    async fn list_snapshots(&self, subject_id: DbId) -> Result<Vec<VersionSnapshot>, CoreError> {
        Ok(self
            .state
            .read()
            .await
            .versions
            .for_subject(subject_id)
            .cloned()
            .collect())
    }

    async fn count_snapshots(&self, subject_id: DbId) -> Result<i64, CoreError> {
        Ok(self
            .state
            .read()
            .await
            .versions
            .for_subject(subject_id)
            .count() as i64)
    }
}

#[async_trait]
impl OutgoingIntentRepository for InMemoryStorage {
    async fn create_intent(
        &self,
        input: &CreateOutgoingIntent,
    ) -> Result<OutgoingIntent, CoreError> {
        let mut state = self.state.write().await;
        if state.intents.values().any(|i| i.name == input.name) {
            return Err(CoreError::Conflict(format!(
                "Outgoing intent '{}' already exists",
                input.name
            )));
        }

        let now = chrono::Utc::now();
        state.last_intent_id += 1;
        let intent = OutgoingIntent {
            id: state.last_intent_id,
            name: input.name.clone(),
            created_at: now,
            updated_at: now,
        };
        state.intents.insert(intent.id, intent.clone());
        Ok(intent)
    }

    async fn find_intent(&self, id: DbId) -> Result<Option<OutgoingIntent>, CoreError> {
        Ok(self.state.read().await.intents.get(&id).cloned())
    }

    async fn list_intents(&self, page: PageRequest) -> Result<Vec<OutgoingIntent>, CoreError> {
        let state = self.state.read().await;
        Ok(page_of(state.intents.values().cloned(), page))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn props(markup: &str) -> VersionProperties {
        VersionProperties {
            conditions: String::new(),
            message_markup: markup.to_string(),
        }
    }

    #[test]
    fn version_log_ids_increase_across_subjects() {
        let mut log = InMemoryVersionLog::default();
        let now = chrono::Utc::now();
        let a = log.append(1, props("<a/>"), now);
        let b = log.append(2, props("<b/>"), now);
        let c = log.append(1, props("<c/>"), now);
        assert_eq!((a.id, b.id, c.id), (1, 2, 3));
        assert_eq!(log.latest(1).map(|s| s.id), Some(3));
        assert_eq!(
            log.for_subject(1).map(|s| s.id).collect::<Vec<_>>(),
            vec![3, 1]
        );
    }

    #[test]
    fn version_log_find_requires_matching_subject() {
        let mut log = InMemoryVersionLog::default();
        let snap = log.append(1, props("<a/>"), chrono::Utc::now());
        assert!(log.find(1, snap.id).is_some());
        assert!(log.find(2, snap.id).is_none());
        assert!(log.find(1, snap.id + 1).is_none());
    }

    async fn storage_with_intent() -> (InMemoryStorage, DbId) {
        let storage = InMemoryStorage::new();
        let intent = storage
            .create_intent(&CreateOutgoingIntent {
                name: "intent.core.test".into(),
            })
            .await
            .unwrap();
        (storage, intent.id)
    }

    fn candidate(intent_id: DbId, name: &str) -> TemplateCandidate {
        TemplateCandidate {
            id: None,
            outgoing_intent_id: intent_id,
            name: name.to_string(),
            conditions: String::new(),
            message_markup: "<p/>".to_string(),
        }
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_name_without_writing() {
        let (storage, intent) = storage_with_intent().await;
        storage
            .insert_with_snapshot(&candidate(intent, "dup"))
            .await
            .unwrap();

        let err = storage
            .insert_with_snapshot(&candidate(intent, "dup"))
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::Validation(_));
        assert_eq!(storage.count_templates().await.unwrap(), 1);
        assert_eq!(storage.snapshot_total().await, 1);
    }

    #[tokio::test]
    async fn insert_requires_existing_intent() {
        let storage = InMemoryStorage::new();
        let err = storage
            .insert_with_snapshot(&candidate(99, "orphan"))
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::NotFound { id: 99, .. });
        assert_eq!(storage.snapshot_total().await, 0);
    }

    #[tokio::test]
    async fn update_of_missing_template_writes_nothing() {
        let (storage, intent) = storage_with_intent().await;
        let mut c = candidate(intent, "ghost");
        c.id = Some(42);
        assert!(storage.update_with_snapshot(&c).await.unwrap().is_none());
        assert_eq!(storage.snapshot_total().await, 0);
    }

    #[tokio::test]
    async fn delete_keeps_history_and_respects_intent_scope() {
        let (storage, intent) = storage_with_intent().await;
        let (t, _) = storage
            .insert_with_snapshot(&candidate(intent, "keep"))
            .await
            .unwrap();

        assert!(!storage.delete_template(t.id, Some(intent + 1)).await.unwrap());
        assert!(storage.delete_template(t.id, Some(intent)).await.unwrap());
        assert!(!storage.delete_template(t.id, None).await.unwrap());

        assert!(storage.find_template(t.id).await.unwrap().is_none());
        assert_eq!(storage.count_snapshots(t.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn list_is_insertion_ordered_and_paged() {
        let (storage, intent) = storage_with_intent().await;
        for name in ["a", "b", "c"] {
            storage
                .insert_with_snapshot(&candidate(intent, name))
                .await
                .unwrap();
        }

        let page = PageRequest::new(Some(2), Some(2), 50);
        let names: Vec<String> = storage
            .list_templates(intent, page)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["c".to_string()]);
    }

    #[tokio::test]
    async fn duplicate_intent_name_conflicts() {
        let (storage, _) = storage_with_intent().await;
        let err = storage
            .create_intent(&CreateOutgoingIntent {
                name: "intent.core.test".into(),
            })
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::Conflict(_));
    }
}
