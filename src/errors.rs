use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Standard JSON error body returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Bad Request")
    pub error: String,
    /// Human-readable error description
    pub message: String,
    /// Additional detail, e.g. the 1C order id of an unreconciled order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// ISO 8601 timestamp when the error occurred
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::error::DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    /// 1C declined the order for a business reason.
    #[error("Rejected by 1C: {0}")]
    RemoteRejected(String),

    /// Transport-level failure talking to 1C (connection refused, DNS, TLS)
    /// or an HTTP error status from its endpoints.
    #[error("1C unreachable: {0}")]
    RemoteUnreachable(String),

    /// The bounded timeout for a 1C call elapsed.
    #[error("1C timed out: {0}")]
    RemoteTimeout(String),

    /// 1C answered with something that does not parse as the expected contract.
    #[error("Malformed response from 1C: {0}")]
    RemoteMalformed(String),

    /// The order exists in 1C but local persistence failed afterwards. The
    /// remote id is carried so an operator can reconcile by hand; this is
    /// never retried automatically.
    #[error("Order {onec_id} was created in 1C but could not be saved locally: {message}")]
    RemoteInconsistency { onec_id: String, message: String },
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// Single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::DatabaseError(_) | Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_) | Self::BadRequest(_) | Self::RemoteRejected(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::RemoteUnreachable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::RemoteTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::RemoteMalformed(_) => StatusCode::BAD_GATEWAY,
            Self::RemoteInconsistency { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message suitable for HTTP responses. Internal errors return generic
    /// messages so implementation details never leak; the inconsistency
    /// variant is the exception and always surfaces its full message.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::InternalError(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }

    /// Extra detail attached to the response body, when the variant has one.
    pub fn response_details(&self) -> Option<String> {
        match self {
            Self::RemoteInconsistency { onec_id, .. } => Some(format!("order_1c_id={}", onec_id)),
            _ => None,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let err = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.response_message(),
            details: self.response_details(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(err)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_mapping() {
        assert_eq!(
            ServiceError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::ValidationError("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::RemoteRejected("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::RemoteUnreachable("x".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ServiceError::RemoteTimeout("x".into()).status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            ServiceError::RemoteMalformed("x".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ServiceError::RemoteInconsistency {
                onec_id: "X".into(),
                message: "db down".into()
            }
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn inconsistency_carries_the_remote_id() {
        let err = ServiceError::RemoteInconsistency {
            onec_id: "ORDER-AB12CD34".into(),
            message: "insert failed".into(),
        };
        assert!(err.response_message().contains("ORDER-AB12CD34"));
        assert_eq!(
            err.response_details().as_deref(),
            Some("order_1c_id=ORDER-AB12CD34")
        );
    }

    #[test]
    fn internal_errors_hide_details() {
        assert_eq!(
            ServiceError::InternalError("sensitive".into()).response_message(),
            "Internal server error"
        );
        assert_eq!(
            ServiceError::ValidationError("items[0].quantity must be positive".into())
                .response_message(),
            "Validation error: items[0].quantity must be positive"
        );
    }

    #[tokio::test]
    async fn error_response_body_shape() {
        use axum::body::to_bytes;

        let response = ServiceError::NotFound("missing".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(payload.error, "Not Found");
        assert_eq!(payload.message, "Not found: missing");
    }
}
