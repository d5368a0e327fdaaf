use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use responder_core::error::CoreError;
use serde_json::json;

/// Error type returned by HTTP handlers.
///
/// Storage backends already fold their own failures into [`CoreError`], so
/// the domain error is the only source. [`IntoResponse`] renders it as
/// `{error, code}` JSON, plus `field` for validation failures.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Validation failures also name the offending field.
        if let AppError::Core(CoreError::Validation(failure)) = &self {
            let body = json!({
                "error": failure.message,
                "code": "VALIDATION_ERROR",
                "field": failure.field,
            });
            return (StatusCode::BAD_REQUEST, axum::Json(body)).into_response();
        }

        let AppError::Core(core) = &self;
        let (status, code, message) = classify_core_error(core);

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

fn classify_core_error(err: &CoreError) -> (StatusCode, &'static str, String) {
    match err {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(failure) => (
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            failure.message.clone(),
        ),
        CoreError::RestorationFailed(msg) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "RESTORATION_FAILED",
            msg.clone(),
        ),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::Storage(msg) => {
            tracing::error!(error = %msg, "Storage error");
            internal()
        }
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            internal()
        }
    }
}
