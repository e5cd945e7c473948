use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use shared::{ExceptionWrapper, ValidationExceptionWrapper};
use tracing::{error, info, warn};

use crate::application::{FieldViolation, UserServiceError};

const GENERIC_FAILURE: &str = "Action failed: An error occurred!";

impl UserServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::AlreadyExists | Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::UpstreamUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<&FieldViolation> for ValidationExceptionWrapper {
    fn from(violation: &FieldViolation) -> Self {
        Self {
            error_field: violation.field.to_string(),
            rejected_value: violation.rejected_value.clone(),
            reason: violation.reason.clone(),
        }
    }
}

impl IntoResponse for UserServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            Self::Internal(source) => {
                error!(error = %source, "request failed");
                ExceptionWrapper::new(status.as_u16(), GENERIC_FAILURE)
            }
            Self::UpstreamUnavailable { service, failure } => {
                warn!(%service, %failure, "request refused, work service unavailable");
                ExceptionWrapper::new(status.as_u16(), self.to_string())
            }
            Self::ValidationFailed(violations) => {
                info!(violations = violations.len(), "request rejected by validation");
                ExceptionWrapper::new(status.as_u16(), self.to_string())
                    .with_violations(violations.iter().map(ValidationExceptionWrapper::from).collect())
            }
            other => {
                info!(error = %other, "request rejected");
                ExceptionWrapper::new(status.as_u16(), other.to_string())
            }
        };
        (status, Json(body)).into_response()
    }
}
