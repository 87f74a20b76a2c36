//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::accounts::AccountError;
use crate::analysis::AnalysisError;
use crate::delivery::DeliveryError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Username already exists")]
    UsernameTaken,
    #[error("Well not found: {0}")]
    WellNotFound(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Email delivery is not configured")]
    DeliveryUnavailable,
    #[error("Email delivery failed: {0}")]
    DeliveryFailed(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "AUTH_REQUIRED",
                "Authentication required".to_string(),
            ),
            ApiError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Invalid username or password".to_string(),
            ),
            ApiError::UsernameTaken => (
                StatusCode::CONFLICT,
                "USERNAME_TAKEN",
                "Username already exists".to_string(),
            ),
            ApiError::WellNotFound(query) => (
                StatusCode::NOT_FOUND,
                "WELL_NOT_FOUND",
                format!("No data found for well {query:?}"),
            ),
            ApiError::BadRequest(detail) => (
                StatusCode::BAD_REQUEST,
                "BAD_REQUEST",
                detail.clone(),
            ),
            ApiError::DeliveryUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "DELIVERY_UNAVAILABLE",
                "Email delivery is not configured".to_string(),
            ),
            ApiError::DeliveryFailed(detail) => {
                tracing::error!(detail, "Email delivery failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "DELIVERY_FAILED",
                    "Failed to send email".to_string(),
                )
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::UsernameTaken(_) => ApiError::UsernameTaken,
            AccountError::InvalidCredentials => ApiError::InvalidCredentials,
            AccountError::InvalidInput(field) => {
                ApiError::BadRequest(format!("{field} must not be empty"))
            }
            AccountError::Hashing(e) => ApiError::Internal(e),
            AccountError::Database(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<DeliveryError> for ApiError {
    fn from(err: DeliveryError) -> Self {
        match err {
            DeliveryError::InvalidRecipient(_) => {
                ApiError::BadRequest("A valid recipient email address is required".into())
            }
            DeliveryError::NotConfigured => ApiError::DeliveryUnavailable,
            DeliveryError::Io(e) => ApiError::Internal(e.to_string()),
            DeliveryError::Message(e) | DeliveryError::Transport(e) => ApiError::DeliveryFailed(e),
        }
    }
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::WellNotFound { query } => ApiError::WellNotFound(query),
            AnalysisError::Delivery(e) => e.into(),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("blocking task failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), 4096).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn unauthorized_returns_401() {
        let response = ApiError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "AUTH_REQUIRED");
    }

    #[tokio::test]
    async fn well_not_found_returns_404_with_query() {
        let response = ApiError::WellNotFound("999".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "WELL_NOT_FOUND");
        assert!(json["error"]["message"].as_str().unwrap().contains("999"));
    }

    #[tokio::test]
    async fn internal_error_hides_detail() {
        let response = ApiError::Internal("disk I/O error at /var/db".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "INTERNAL");
        assert!(!json["error"]["message"].as_str().unwrap().contains("/var/db"));
    }

    #[tokio::test]
    async fn delivery_failure_hides_transport_detail() {
        let err: ApiError = DeliveryError::Transport("535 auth failed for bob".into()).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "DELIVERY_FAILED");
        assert!(!json["error"]["message"].as_str().unwrap().contains("bob"));
    }

    #[test]
    fn account_errors_map_to_distinct_codes() {
        assert!(matches!(
            ApiError::from(AccountError::UsernameTaken("a".into())),
            ApiError::UsernameTaken
        ));
        assert!(matches!(
            ApiError::from(AccountError::InvalidCredentials),
            ApiError::InvalidCredentials
        ));
        assert!(matches!(
            ApiError::from(AccountError::InvalidInput("name")),
            ApiError::BadRequest(_)
        ));
    }

    #[test]
    fn unconfigured_delivery_is_unavailable() {
        assert!(matches!(
            ApiError::from(DeliveryError::NotConfigured),
            ApiError::DeliveryUnavailable
        ));
    }
}
