use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use voyage_core::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Missing or malformed bearer token")]
    MissingToken,

    #[error("Rate limit exceeded")]
    RateLimited,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Core(err) => match err {
                CoreError::ValidationError(_) => StatusCode::BAD_REQUEST,
                CoreError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
                CoreError::PaymentDeclined(_) => StatusCode::PAYMENT_REQUIRED,
                CoreError::Forbidden(_) => StatusCode::FORBIDDEN,
                CoreError::NotFound(_) => StatusCode::NOT_FOUND,
                CoreError::Conflict(_) => StatusCode::CONFLICT,
                CoreError::StorageError(_) | CoreError::InternalError(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            AppError::MissingToken => StatusCode::UNAUTHORIZED,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    pub fn code(&self) -> &'static str {
        match self.status() {
            StatusCode::BAD_REQUEST => "VALIDATION_ERROR",
            StatusCode::UNAUTHORIZED => "UNAUTHORIZED",
            StatusCode::PAYMENT_REQUIRED => "PAYMENT_REQUIRED",
            StatusCode::FORBIDDEN => "FORBIDDEN",
            StatusCode::NOT_FOUND => "NOT_FOUND",
            StatusCode::CONFLICT => "CONFLICT",
            StatusCode::TOO_MANY_REQUESTS => "RATE_LIMITED",
            _ => "INTERNAL_ERROR",
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::Core(CoreError::ValidationError(msg))
            | AppError::Core(CoreError::NotFound(msg))
            | AppError::Core(CoreError::Conflict(msg))
            | AppError::Core(CoreError::Forbidden(msg))
            | AppError::Core(CoreError::PaymentDeclined(msg)) => msg.clone(),
            // Token decoding detail is not useful to clients
            AppError::Core(CoreError::Unauthorized(_)) => "Invalid or expired token".to_string(),
            AppError::Core(CoreError::StorageError(_)) | AppError::Core(CoreError::InternalError(_)) => {
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Internal Server Error: {}", self);
        } else {
            tracing::debug!("Request failed with {}: {}", status, self);
        }

        let body = Json(json!({
            "error": self.code(),
            "message": self.message(),
        }));

        (status, body).into_response()
    }
}

/// Success envelope: `{ "success": true, "data": ... }`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self { success: true, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_map_to_codes() {
        let cases = [
            (CoreError::ValidationError("x".into()), StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            (CoreError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            (CoreError::PaymentDeclined("x".into()), StatusCode::PAYMENT_REQUIRED, "PAYMENT_REQUIRED"),
            (CoreError::Forbidden("x".into()), StatusCode::FORBIDDEN, "FORBIDDEN"),
            (CoreError::NotFound("x".into()), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (CoreError::Conflict("x".into()), StatusCode::CONFLICT, "CONFLICT"),
            (CoreError::StorageError("x".into()), StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        ];

        for (err, status, code) in cases {
            let err = AppError::from(err);
            assert_eq!(err.status(), status);
            assert_eq!(err.code(), code);
        }
        assert_eq!(AppError::RateLimited.code(), "RATE_LIMITED");
        assert_eq!(AppError::MissingToken.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_internal_detail_is_not_exposed() {
        let err = AppError::from(CoreError::StorageError("connection refused to 10.0.0.5".into()));
        assert_eq!(err.message(), "Internal Server Error");
    }
}
