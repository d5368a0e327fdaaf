pub mod health;
pub mod message_template;
pub mod outgoing_intent;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /outgoing-intents                                        list, create
/// /outgoing-intents/{intent_id}                            get
/// /outgoing-intents/{intent_id}/message-templates          list, create
/// /outgoing-intents/{intent_id}/message-templates/{id}     get, update, delete
///
/// /message-templates/{id}/versions                         history
/// /message-templates/{id}/versions/{version_id}            one snapshot
/// /message-templates/{id}/restore/{version_id}             restore (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest(
            "/outgoing-intents",
            outgoing_intent::router().merge(message_template::intent_router()),
        )
        .nest("/message-templates", message_template::version_router())
}
