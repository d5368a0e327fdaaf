//! Integration tests for the PostgreSQL template storage.
//!
//! Exercises `PgStorage` and the `*Repo` functions against a real database:
//! - Create writes the template and its first snapshot together
//! - A failed write leaves neither a row nor a snapshot behind
//! - Name uniqueness is enforced by the `uq_message_templates_name` index
//! - Update of a missing or foreign template is a no-op
//! - Deleting a template keeps its version history
//! - Restore through the service layer appends a new snapshot

use std::sync::Arc;

use assert_matches::assert_matches;
use responder_core::error::CoreError;
use responder_core::message_template::{
    CreateMessageTemplate, TemplateCandidate, UpdateMessageTemplate,
};
use responder_core::outgoing_intent::CreateOutgoingIntent;
use responder_core::paging::PageRequest;
use responder_core::repository::{OutgoingIntentRepository, TemplateRepository};
use responder_core::restore::RestoreService;
use responder_core::template_store::TemplateStore;
use responder_core::types::DbId;
use responder_core::validation::NAME_TAKEN_MESSAGE;
use responder_db::repositories::{MessageTemplateRepo, TemplateVersionRepo};
use responder_db::PgStorage;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn setup(pool: &PgPool, intent_name: &str) -> (Arc<PgStorage>, DbId) {
    let storage = Arc::new(PgStorage::new(pool.clone()));
    let intent = storage
        .create_intent(&CreateOutgoingIntent {
            name: intent_name.to_string(),
        })
        .await
        .unwrap();
    (storage, intent.id)
}

fn new_template(name: &str, markup: &str) -> CreateMessageTemplate {
    CreateMessageTemplate {
        name: name.to_string(),
        conditions: Some("always".to_string()),
        message_markup: markup.to_string(),
    }
}

async fn total_versions(pool: &PgPool) -> i64 {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM message_template_versions")
        .fetch_one(pool)
        .await
        .unwrap();
    row.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_create_writes_template_and_snapshot(pool: PgPool) {
    let (storage, intent) = setup(&pool, "intent.db.create").await;
    let store = TemplateStore::with_default_rules(storage.clone());

    let created = store
        .create(intent, &new_template("Greeting", "<p>Hi {{name}}</p>"))
        .await
        .unwrap();

    assert_eq!(created.template.outgoing_intent_id, intent);
    assert_eq!(created.version.subject_id, created.template.id);
    assert_eq!(created.version.properties, created.template.properties());

    let row = TemplateVersionRepo::find(&pool, created.template.id, created.version.id)
        .await
        .unwrap()
        .expect("snapshot persisted");
    assert_eq!(row.properties.0.message_markup, "<p>Hi {{name}}</p>");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_insert_for_missing_intent_rolls_back(pool: PgPool) {
    let (storage, intent) = setup(&pool, "intent.db.missing").await;
    let candidate = TemplateCandidate::new(intent + 1000, &new_template("Orphan", "<p/>"));

    let err = storage.insert_with_snapshot(&candidate).await.unwrap_err();
    assert_matches!(err, CoreError::NotFound { entity: "OutgoingIntent", .. });
    assert_eq!(MessageTemplateRepo::count(&pool).await.unwrap(), 0);
    assert_eq!(total_versions(&pool).await, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_unique_index_reports_name_taken(pool: PgPool) {
    let (storage, intent) = setup(&pool, "intent.db.unique").await;
    let first = TemplateCandidate::new(intent, &new_template("Same", "<p/>"));
    storage.insert_with_snapshot(&first).await.unwrap();

    // Bypass the pipeline so the database constraint is what fires.
    let err = storage.insert_with_snapshot(&first).await.unwrap_err();
    assert_matches!(err, CoreError::Validation(ref f) if f.message == NAME_TAKEN_MESSAGE);
    assert_eq!(MessageTemplateRepo::count(&pool).await.unwrap(), 1);
    assert_eq!(total_versions(&pool).await, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_name_in_use_excludes_own_id(pool: PgPool) {
    let (storage, intent) = setup(&pool, "intent.db.exclude").await;
    let (template, _) = storage
        .insert_with_snapshot(&TemplateCandidate::new(intent, &new_template("Mine", "<p/>")))
        .await
        .unwrap();

    assert!(storage.name_in_use("Mine", None).await.unwrap());
    assert!(!storage.name_in_use("Mine", Some(template.id)).await.unwrap());
    assert!(!storage.name_in_use("mine", None).await.unwrap());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_missing_or_foreign_is_noop(pool: PgPool) {
    let (storage, intent) = setup(&pool, "intent.db.noop").await;
    let store = TemplateStore::with_default_rules(storage.clone());
    let created = store
        .create(intent, &new_template("Scoped", "<p/>"))
        .await
        .unwrap();

    let patch = UpdateMessageTemplate {
        message_markup: Some("<p>changed</p>".into()),
        ..Default::default()
    };
    assert!(store.update(created.template.id + 50, &patch).await.unwrap().is_none());
    assert!(store
        .update_in_intent(intent + 1, created.template.id, &patch)
        .await
        .unwrap()
        .is_none());

    let current = storage.find_template(created.template.id).await.unwrap().unwrap();
    assert_eq!(current.message_markup, "<p/>");
    assert_eq!(total_versions(&pool).await, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_delete_keeps_history(pool: PgPool) {
    let (storage, intent) = setup(&pool, "intent.db.delete").await;
    let store = TemplateStore::with_default_rules(storage.clone());
    let created = store
        .create(intent, &new_template("Doomed", "<p/>"))
        .await
        .unwrap();

    assert!(!store.delete_in_intent(intent + 1, created.template.id).await.unwrap());
    assert!(store.delete_in_intent(intent, created.template.id).await.unwrap());
    assert!(!store.delete(created.template.id).await.unwrap());

    let history = store.history(created.template.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, created.version.id);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_and_restore_append_snapshots(pool: PgPool) {
    let (storage, intent) = setup(&pool, "intent.db.restore").await;
    let store = TemplateStore::with_default_rules(storage.clone());
    let restorer = RestoreService::new(store.clone());

    let created = store
        .create(intent, &new_template("Greeting", "<p>Hi {{name}}</p>"))
        .await
        .unwrap();
    let patch = UpdateMessageTemplate {
        message_markup: Some("<p>Hello {{name}}</p>".into()),
        ..Default::default()
    };
    let updated = store
        .update(created.template.id, &patch)
        .await
        .unwrap()
        .unwrap();
    assert!(updated.version.id > created.version.id);

    let restored = restorer
        .restore(created.template.id, created.version.id)
        .await
        .unwrap();
    assert!(restored.version.id > updated.version.id);
    assert_eq!(restored.template.message_markup, "<p>Hi {{name}}</p>");
    assert_eq!(restored.template.name, "Greeting");

    let detail = store.fetch(created.template.id).await.unwrap();
    assert_eq!(detail.history.len(), 3);
    assert_eq!(detail.current_version.map(|v| v.id), Some(restored.version.id));

    let latest = storage.latest_snapshot(created.template.id).await.unwrap().unwrap();
    assert_eq!(latest.id, restored.version.id);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_restore_unknown_version_fails(pool: PgPool) {
    let (storage, intent) = setup(&pool, "intent.db.unknown").await;
    let store = TemplateStore::with_default_rules(storage.clone());
    let restorer = RestoreService::new(store.clone());
    let created = store
        .create(intent, &new_template("Lonely", "<p/>"))
        .await
        .unwrap();

    assert_matches!(
        restorer.restore(created.template.id, created.version.id + 10).await,
        Err(CoreError::RestorationFailed(_))
    );
    assert_eq!(total_versions(&pool).await, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_list_is_scoped_and_ordered(pool: PgPool) {
    let (storage, intent) = setup(&pool, "intent.db.list").await;
    let other = storage
        .create_intent(&CreateOutgoingIntent {
            name: "intent.db.list.other".into(),
        })
        .await
        .unwrap();
    let store = TemplateStore::with_default_rules(storage.clone());

    for name in ["One", "Two", "Three"] {
        store.create(intent, &new_template(name, "<p/>")).await.unwrap();
    }
    store
        .create(other.id, &new_template("Elsewhere", "<p/>"))
        .await
        .unwrap();

    let page = PageRequest::new(Some(1), Some(2), 50);
    let first: Vec<String> = store
        .list(intent, page)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(first, vec!["One".to_string(), "Two".to_string()]);

    let second = store
        .list(intent, PageRequest::new(Some(2), Some(2), 50))
        .await
        .unwrap();
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].name, "Three");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_duplicate_intent_name_conflicts(pool: PgPool) {
    let (storage, _) = setup(&pool, "intent.db.dup").await;
    let err = storage
        .create_intent(&CreateOutgoingIntent {
            name: "intent.db.dup".into(),
        })
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Conflict(_));
    assert!(storage.health_check().await.is_ok());
}
