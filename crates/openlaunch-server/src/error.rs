//! HTTP error mapping.
//!
//! Every failure that reaches the HTTP boundary becomes an [`ApiError`] and
//! is rendered as `{"detail": ...}` with a status chosen by its kind.
//! Internal details (SQL text, driver messages, panic payloads) are logged
//! and replaced by a generic detail in the response.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use openlaunch_db::{DbError, MappingError};
use serde_json::json;
use std::any::Any;
use thiserror::Error;

const INTERNAL_DETAIL: &str = "Internal Server Error";

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body, query or path did not validate.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The requested entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The write violated a database constraint.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The database could not be reached.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// A handler chose an explicit status and detail.
    #[error("{status}: {detail}")]
    Http { status: StatusCode, detail: String },

    /// Anything else; the message is logged, never returned.
    #[error("internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Builds an explicit HTTP error.
    pub fn http(status: StatusCode, detail: impl Into<String>) -> Self {
        Self::Http {
            status,
            detail: detail.into(),
        }
    }

    /// Status code this error is rendered with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Http { status, .. } => *status,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match self {
            ApiError::Validation(msg) | ApiError::NotFound(msg) | ApiError::Conflict(msg) => msg,
            ApiError::Http { detail, .. } => detail,
            ApiError::Unavailable(msg) => {
                tracing::warn!(error = %msg, "dependency unavailable");
                "Service Unavailable".to_string()
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "request failed");
                INTERNAL_DETAIL.to_string()
            }
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        if e.is_integrity_violation() {
            let detail = match e.constraint() {
                Some(constraint) => format!("integrity constraint violated: {constraint}"),
                None => "integrity constraint violated".to_string(),
            };
            tracing::debug!(error = %e, "integrity violation");
            return Self::Conflict(detail);
        }

        match e {
            DbError::NotFound(what) => Self::NotFound(format!("{what} not found")),
            DbError::Pool(e) => Self::Unavailable(e.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<MappingError> for ApiError {
    fn from(e: MappingError) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Internal(e.to_string())
    }
}

/// Fallback for unmatched routes.
pub async fn not_found() -> ApiError {
    ApiError::http(StatusCode::NOT_FOUND, "Not Found")
}

/// Fallback for matched routes called with an unsupported method.
pub async fn method_not_allowed() -> ApiError {
    ApiError::http(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
}

/// Converts a caught handler panic into a 500 response.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    };

    ApiError::Internal(format!("handler panicked: {message}")).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn validation_errors_render_422_with_detail() {
        let response = ApiError::Validation("missing field `title`".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(response).await["detail"], "missing field `title`");
    }

    #[tokio::test]
    async fn internal_errors_hide_their_message() {
        let response = ApiError::Internal("relation \"secret\" does not exist".to_string())
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["detail"], INTERNAL_DETAIL);
    }

    #[tokio::test]
    async fn explicit_http_errors_keep_status_and_detail() {
        let response = ApiError::http(StatusCode::FORBIDDEN, "nope").into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(response).await["detail"], "nope");
    }

    #[test]
    fn db_not_found_maps_to_404() {
        let err = ApiError::from(DbError::NotFound("order".to_string()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert!(matches!(err, ApiError::NotFound(ref msg) if msg == "order not found"));
    }

    #[test]
    fn db_task_failure_maps_to_500() {
        let err = ApiError::from(DbError::Task("cancelled".to_string()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn panics_render_generic_500() {
        let response = handle_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["detail"], INTERNAL_DETAIL);
    }
}
