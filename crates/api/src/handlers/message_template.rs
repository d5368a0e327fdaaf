//! Handlers for message templates, their version history and restore.
//!
//! Writes go through [`TemplateStore`](responder_core::template_store::TemplateStore)
//! so every accepted change records a snapshot; restore goes through
//! [`RestoreService`](responder_core::restore::RestoreService).

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use responder_core::message_template::{CreateMessageTemplate, UpdateMessageTemplate};
use responder_core::paging::PageParams;
use responder_core::types::DbId;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET /outgoing-intents/{intent_id}/message-templates
// ---------------------------------------------------------------------------

/// List an intent's templates in insertion order. An unknown intent simply
/// has no templates.
pub async fn list_templates(
    State(state): State<AppState>,
    Path(intent_id): Path<DbId>,
    Query(params): Query<PageParams>,
) -> AppResult<impl IntoResponse> {
    let templates = state.templates.list(intent_id, state.page(&params)).await?;

    tracing::debug!(count = templates.len(), intent_id, "Listed message templates");

    Ok(Json(DataResponse { data: templates }))
}

// ---------------------------------------------------------------------------
// POST /outgoing-intents/{intent_id}/message-templates
// ---------------------------------------------------------------------------

pub async fn create_template(
    State(state): State<AppState>,
    Path(intent_id): Path<DbId>,
    Json(input): Json<CreateMessageTemplate>,
) -> AppResult<impl IntoResponse> {
    let created = state.templates.create(intent_id, &input).await?;

    tracing::info!(
        template_id = created.template.id,
        intent_id,
        version_id = created.version.id,
        "Message template created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

// ---------------------------------------------------------------------------
// GET /outgoing-intents/{intent_id}/message-templates/{id}
// ---------------------------------------------------------------------------

/// Fetch a template with its current version and history.
///
/// The lookup is by template id alone; the intent segment only locates the
/// route.
pub async fn get_template(
    State(state): State<AppState>,
    Path((_intent_id, id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let detail = state.templates.fetch(id).await?;
    Ok(Json(DataResponse { data: detail }))
}

// ---------------------------------------------------------------------------
// PUT/PATCH /outgoing-intents/{intent_id}/message-templates/{id}
// ---------------------------------------------------------------------------

/// Apply a partial update.
///
/// A template that does not exist under this intent is left alone and the
/// request answers `204 No Content`.
pub async fn update_template(
    State(state): State<AppState>,
    Path((intent_id, id)): Path<(DbId, DbId)>,
    Json(patch): Json<UpdateMessageTemplate>,
) -> AppResult<Response> {
    match state.templates.update_in_intent(intent_id, id, &patch).await? {
        Some(updated) => {
            tracing::info!(
                template_id = id,
                intent_id,
                version_id = updated.version.id,
                "Message template updated"
            );
            Ok(Json(DataResponse { data: updated }).into_response())
        }
        None => {
            tracing::debug!(template_id = id, intent_id, "Update skipped, template absent");
            Ok(StatusCode::NO_CONTENT.into_response())
        }
    }
}

// ---------------------------------------------------------------------------
// DELETE /outgoing-intents/{intent_id}/message-templates/{id}
// ---------------------------------------------------------------------------

/// Delete a template. Idempotent: a missing template also answers 204.
pub async fn delete_template(
    State(state): State<AppState>,
    Path((intent_id, id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    if state.templates.delete_in_intent(intent_id, id).await? {
        tracing::info!(template_id = id, intent_id, "Message template deleted");
    } else {
        tracing::debug!(template_id = id, intent_id, "Delete skipped, template absent");
    }
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// GET /message-templates/{id}/versions
// ---------------------------------------------------------------------------

/// Version history of a template, newest first.
pub async fn list_versions(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let history = state.templates.history(id).await?;
    Ok(Json(DataResponse { data: history }))
}

// ---------------------------------------------------------------------------
// GET /message-templates/{id}/versions/{version_id}
// ---------------------------------------------------------------------------

pub async fn get_version(
    State(state): State<AppState>,
    Path((id, version_id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let version = state.templates.version(id, version_id).await?;
    Ok(Json(DataResponse { data: version }))
}

// ---------------------------------------------------------------------------
// POST /message-templates/{id}/restore/{version_id}
// ---------------------------------------------------------------------------

/// Restore a template's conditions and markup from an earlier version.
/// The restore itself is recorded as a new version.
pub async fn restore_version(
    State(state): State<AppState>,
    Path((id, version_id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let restored = state.restorer.restore(id, version_id).await?;

    tracing::info!(
        template_id = id,
        restored_from = version_id,
        version_id = restored.version.id,
        "Message template restored"
    );

    Ok(Json(DataResponse { data: restored }))
}
