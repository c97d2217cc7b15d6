//! Request-level error taxonomy and its HTTP mapping.

use crate::utils::error::Error;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Everything that can go wrong while handling one webhook call.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Request body is empty")]
    EmptyRequest,

    #[error("Malformed JSON: {0}")]
    MalformedJson(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl IngestError {
    pub fn status(&self) -> StatusCode {
        match self {
            | IngestError::EmptyRequest | IngestError::MalformedJson(_) => StatusCode::BAD_REQUEST,
            | IngestError::StoreUnavailable(_) | IngestError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable machine-readable code carried in the response body
    pub fn code(&self) -> &'static str {
        match self {
            | IngestError::EmptyRequest => "EMPTY_REQUEST",
            | IngestError::MalformedJson(_) => "MALFORMED_JSON",
            | IngestError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            | IngestError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Outcome label used for metrics
    pub fn outcome(&self) -> &'static str {
        match self {
            | IngestError::EmptyRequest => "empty_request",
            | IngestError::MalformedJson(_) => "malformed_json",
            | IngestError::StoreUnavailable(_) => "store_unavailable",
            | IngestError::InternalError(_) => "internal_error",
        }
    }
}

impl From<Error> for IngestError {
    fn from(err: Error) -> Self {
        match err {
            | Error::StoreUnavailable(msg) => IngestError::StoreUnavailable(msg),
            | other => IngestError::InternalError(other.to_string()),
        }
    }
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Store details stay in the logs; clients get a fixed message.
        let message = match &self {
            | IngestError::EmptyRequest => "Request body must be a non-empty JSON object.".to_string(),
            | IngestError::MalformedJson(detail) => format!("Request must be a JSON object: {}", detail),
            | IngestError::StoreUnavailable(_) => "Redis connection is not available.".to_string(),
            | IngestError::InternalError(_) => "Internal server error.".to_string(),
        };

        let body = Json(json!({
            "error": self.code(),
            "message": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_400() {
        assert_eq!(IngestError::EmptyRequest.status(), StatusCode::BAD_REQUEST);
        assert_eq!(IngestError::MalformedJson("x".into()).status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn store_errors_map_to_500_variants() {
        let unavailable = IngestError::from(Error::StoreUnavailable("refused".into()));
        assert_eq!(unavailable.code(), "STORE_UNAVAILABLE");
        assert_eq!(unavailable.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let rejected = IngestError::from(Error::StoreError("WRONGTYPE".into()));
        assert_eq!(rejected.code(), "INTERNAL_ERROR");
        assert_eq!(rejected.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
