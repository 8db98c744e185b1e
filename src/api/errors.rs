//! Mapping of ledger errors onto HTTP responses
//!
//! Every error body has the shape `{"error": <code>, "message": <text>}`:
//!
//! | Kind                | Status | Code                 |
//! |---------------------|--------|----------------------|
//! | `NotFound`          | 404    | `not_found`          |
//! | `InvalidArgument`   | 400    | `invalid_argument`   |
//! | `InsufficientFunds` | 400    | `insufficient_funds` |
//! | `Conflict`          | 409    | `conflict`           |
//! | `Internal`          | 500    | `internal`           |

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use crate::types::{ErrorKind, LedgerError};

/// Map a ledger error onto an HTTP response
///
/// Internal errors are logged here and answered with a fixed message so no
/// storage detail reaches the client.
pub fn ledger_error_to_response(err: LedgerError) -> Response {
    match err.kind() {
        ErrorKind::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", err.to_string()),
        ErrorKind::InvalidArgument => {
            json_error(StatusCode::BAD_REQUEST, "invalid_argument", err.to_string())
        }
        ErrorKind::InsufficientFunds => {
            json_error(StatusCode::BAD_REQUEST, "insufficient_funds", err.to_string())
        }
        ErrorKind::Conflict => json_error(StatusCode::CONFLICT, "conflict", err.to_string()),
        ErrorKind::Internal => {
            error!(error = %err, "request failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                "internal error",
            )
        }
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
