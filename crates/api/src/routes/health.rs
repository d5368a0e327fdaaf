//! `GET /health`, mounted at the root rather than under `/api/v1`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok`, or `unavailable` when storage does not answer.
    pub status: &'static str,
    pub version: &'static str,
    /// Backend holding templates: `postgres` or `memory`.
    pub storage: &'static str,
    /// Stored template count. Absent when storage is unavailable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub templates: Option<i64>,
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let repository = state.templates.repository();
    let templates = match repository.health_check().await {
        Ok(()) => repository.count_templates().await.ok(),
        Err(err) => {
            tracing::warn!(error = %err, "Storage health check failed");
            None
        }
    };

    let (code, status) = match templates {
        Some(_) => (StatusCode::OK, "ok"),
        None => (StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
    };
    let storage = if state.config.database_url.is_some() {
        "postgres"
    } else {
        "memory"
    };

    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            storage,
            templates,
        }),
    )
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
