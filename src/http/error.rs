//! Error responses.
//!
//! # Responsibilities
//! - Map subsystem errors to HTTP status codes
//! - Render every failure as a JSON body with a readable message
//!
//! # Mapping
//! ```text
//! Validation  → 400
//! NotFound    → 404
//! Store       → 500
//! Allocation  → 500 (with instance and allocator message)
//! Internal    → 500
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;
use crate::stress::AllocationError;
use crate::tasks::TaskError;

/// Error returned by handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("failed to {action}")]
    Store {
        action: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("failed to allocate memory")]
    Allocation {
        instance: String,
        #[source]
        source: AllocationError,
    },

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Adapter for `map_err` naming what the handler was doing.
    pub fn task(action: &'static str) -> impl FnOnce(TaskError) -> ApiError {
        move |e| match e {
            TaskError::Validation(message) => ApiError::Validation(message),
            TaskError::NotFound(_) => ApiError::NotFound("task not found".to_string()),
            TaskError::Store(source) => ApiError::Store { action, source },
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Store { .. } | ApiError::Allocation { .. } | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Store { action, source } => {
                tracing::error!(error = %source, "Failed to {}", action);
                json!({ "error": self.to_string() })
            }
            ApiError::Allocation { instance, source } => {
                tracing::error!(error = %source, block_count = source.block_count, "Failed to allocate memory");
                json!({
                    "error": self.to_string(),
                    "instance": instance,
                    "message": source.message,
                })
            }
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Internal error");
                json!({ "error": self.to_string() })
            }
            ApiError::Validation(_) | ApiError::NotFound(_) => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let validation = ApiError::task("create task")(TaskError::Validation("text required".into()));
        assert_eq!(validation.status(), StatusCode::BAD_REQUEST);
        assert_eq!(validation.to_string(), "text required");

        let missing = ApiError::task("update task")(TaskError::NotFound("1".into()));
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let store = ApiError::task("list tasks")(TaskError::Store(StoreError::Timeout(10)));
        assert_eq!(store.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(store.to_string(), "failed to list tasks");
    }

    #[tokio::test]
    async fn test_allocation_body() {
        let err = ApiError::Allocation {
            instance: "A".into(),
            source: AllocationError {
                message: "capacity overflow".into(),
                requested_bytes: 1,
                block_count: 0,
            },
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["instance"], "A");
        assert_eq!(body["message"], "capacity overflow");
    }
}
