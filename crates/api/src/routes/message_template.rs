//! Route definitions for message templates.
//!
//! ```text
//! INTENT-SCOPED (merged into /outgoing-intents):
//! GET    /{intent_id}/message-templates              list_templates
//! POST   /{intent_id}/message-templates              create_template
//! GET    /{intent_id}/message-templates/{id}         get_template
//! PUT    /{intent_id}/message-templates/{id}         update_template
//! PATCH  /{intent_id}/message-templates/{id}         update_template
//! DELETE /{intent_id}/message-templates/{id}         delete_template
//!
//! VERSIONS (mounted at /message-templates):
//! GET    /{id}/versions                              list_versions
//! GET    /{id}/versions/{version_id}                 get_version
//! POST   /{id}/restore/{version_id}                  restore_version
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::message_template;
use crate::state::AppState;

/// Intent-scoped template routes -- merged into `/outgoing-intents`.
pub fn intent_router() -> Router<AppState> {
    Router::new()
        .route(
            "/{intent_id}/message-templates",
            get(message_template::list_templates).post(message_template::create_template),
        )
        .route(
            "/{intent_id}/message-templates/{id}",
            get(message_template::get_template)
                .put(message_template::update_template)
                .patch(message_template::update_template)
                .delete(message_template::delete_template),
        )
}

/// Version history and restore routes -- mounted at `/message-templates`.
pub fn version_router() -> Router<AppState> {
    Router::new()
        .route("/{id}/versions", get(message_template::list_versions))
        .route(
            "/{id}/versions/{version_id}",
            get(message_template::get_version),
        )
        .route(
            "/{id}/restore/{version_id}",
            post(message_template::restore_version),
        )
}
