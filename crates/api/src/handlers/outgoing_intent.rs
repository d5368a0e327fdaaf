//! Handlers for outgoing intents.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use responder_core::error::CoreError;
use responder_core::outgoing_intent::CreateOutgoingIntent;
use responder_core::paging::PageParams;
use responder_core::types::DbId;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /outgoing-intents
pub async fn list_intents(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> AppResult<impl IntoResponse> {
    let intents = state.intents.list_intents(state.page(&params)).await?;
    tracing::debug!(count = intents.len(), "Listed outgoing intents");
    Ok(Json(DataResponse { data: intents }))
}

/// POST /outgoing-intents
pub async fn create_intent(
    State(state): State<AppState>,
    Json(input): Json<CreateOutgoingIntent>,
) -> AppResult<impl IntoResponse> {
    input.check()?;
    let intent = state.intents.create_intent(&input).await?;

    tracing::info!(intent_id = intent.id, name = %intent.name, "Outgoing intent created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: intent })))
}

/// GET /outgoing-intents/{intent_id}
pub async fn get_intent(
    State(state): State<AppState>,
    Path(intent_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let intent = state
        .intents
        .find_intent(intent_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "OutgoingIntent",
            id: intent_id,
        })?;
    Ok(Json(DataResponse { data: intent }))
}
