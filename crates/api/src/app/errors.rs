use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use vergeerp_core::DomainError;

/// One JSON error shape across the whole API.
pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, "not_found", msg),
        DomainError::AlreadyExists(msg) => json_error(StatusCode::CONFLICT, "already_exists", msg),
        DomainError::AlreadyLinked { .. } => {
            json_error(StatusCode::CONFLICT, "already_linked", err.to_string())
        }
        DomainError::Validation {
            message,
            invalid_modules,
        } => {
            if invalid_modules.is_empty() {
                json_error(StatusCode::BAD_REQUEST, "validation_error", message)
            } else {
                (
                    StatusCode::BAD_REQUEST,
                    axum::Json(json!({
                        "error": "validation_error",
                        "message": message,
                        "invalid_modules": invalid_modules,
                    })),
                )
                    .into_response()
            }
        }
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::Store(e) => {
            json_error(StatusCode::SERVICE_UNAVAILABLE, "store_error", e.to_string())
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
