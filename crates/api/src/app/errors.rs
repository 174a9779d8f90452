use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use tapline_infra::{LedgerError, StoreError};

pub fn ledger_error_to_response(err: LedgerError) -> axum::response::Response {
    match err {
        LedgerError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        LedgerError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        LedgerError::InvalidMovement {
            violation,
            current_stock,
            quantity_change,
        } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            axum::Json(json!({
                "error": "invalid_movement",
                "message": violation.to_string(),
                "current_stock": current_stock,
                "quantity_change": quantity_change,
            })),
        )
            .into_response(),
        LedgerError::ApprovalRequired {
            current_stock,
            quantity_change,
        } => (
            StatusCode::FORBIDDEN,
            axum::Json(json!({
                "error": "approval_required",
                "message": "movement requires manager approval",
                "current_stock": current_stock,
                "quantity_change": quantity_change,
            })),
        )
            .into_response(),
        LedgerError::VenueIsolation(msg) => {
            json_error(StatusCode::FORBIDDEN, "venue_isolation", msg)
        }
        LedgerError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        LedgerError::Store(e) => store_error_to_response(e),
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::Concurrency(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        StoreError::VenueIsolation(msg) => {
            json_error(StatusCode::FORBIDDEN, "venue_isolation", msg)
        }
        StoreError::DuplicateId(msg) => json_error(StatusCode::CONFLICT, "duplicate_id", msg),
        StoreError::InvalidWrite(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invalid_write", msg)
        }
        StoreError::Backend(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", msg)
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
