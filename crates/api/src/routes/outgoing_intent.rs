//! Route definitions for outgoing intents (mounted at `/outgoing-intents`).
//!
//! ```text
//! GET    /                list_intents
//! POST   /                create_intent
//! GET    /{intent_id}     get_intent
//! ```

use axum::routing::get;
use axum::Router;

use crate::handlers::outgoing_intent;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(outgoing_intent::list_intents).post(outgoing_intent::create_intent),
        )
        .route("/{intent_id}", get(outgoing_intent::get_intent))
}
