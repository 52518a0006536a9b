//! Maps `LicenseError` to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kamero_license::LicenseError;
use serde::{Deserialize, Serialize};

/// Body of every failed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Always false.
    pub success: bool,
    /// Human-readable message.
    pub message: String,
}

/// A license error on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(LicenseError);

impl From<LicenseError> for ApiError {
    fn from(err: LicenseError) -> Self {
        Self(err)
    }
}

impl ApiError {
    /// Status code for this error.
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            LicenseError::Validation(_) | LicenseError::InvalidKeyFormat(_) => {
                StatusCode::BAD_REQUEST
            }
            LicenseError::DeviceMismatch => StatusCode::UNAUTHORIZED,
            LicenseError::Expired(_) => StatusCode::FORBIDDEN,
            LicenseError::NotFound => StatusCode::NOT_FOUND,
            LicenseError::Storage(_) | LicenseError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn message(&self) -> &'static str {
        match &self.0 {
            LicenseError::Validation(_) => "Key or appId is required",
            LicenseError::InvalidKeyFormat(_) => "Invalid key format",
            LicenseError::DeviceMismatch => "App Id is invalid",
            LicenseError::Expired(_) => "Key has expired",
            LicenseError::NotFound => "You entered incorrect key",
            LicenseError::Storage(_) | LicenseError::Internal(_) => "Internal server error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if !self.0.is_client_error() {
            tracing::error!(error = %self.0, "Internal server error");
        }

        let body = ApiErrorResponse {
            success: false,
            message: self.message().to_string(),
        };

        (status, Json(body)).into_response()
    }
}
