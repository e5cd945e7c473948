use thiserror::Error;

use crate::application::ports::{IdentityProviderError, RepositoryError};
use crate::domain::{CountFailure, WorkService};

/// One input field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub rejected_value: Option<String>,
    pub reason: String,
}

/// Outcomes of user lifecycle operations other than success.
///
/// Everything except [`UserServiceError::Internal`] is an expected business
/// outcome reported to the caller as-is.
#[derive(Debug, Error)]
pub enum UserServiceError {
    #[error("User does not exist.")]
    NotFound,

    #[error("User already exists.")]
    AlreadyExists,

    #[error("User can not be deleted. User is linked to {count} active {}", .service.item_label())]
    Conflict { service: WorkService, count: u64 },

    #[error("Active item count cannot be retrieved from {service}: {failure}")]
    UpstreamUnavailable { service: WorkService, failure: CountFailure },

    #[error("Invalid Input(s)")]
    ValidationFailed(Vec<FieldViolation>),

    #[error("Access denied: {0}")]
    Forbidden(&'static str),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

/// Failures no caller can act on; detail is for operators only.
#[derive(Debug, Error)]
pub enum InternalError {
    #[error("user store failure: {0}")]
    Repository(#[source] RepositoryError),

    #[error("identity provider failure: {0}")]
    IdentityProvider(#[from] IdentityProviderError),
}

impl From<RepositoryError> for UserServiceError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Duplicate(_) => Self::AlreadyExists,
            RepositoryError::Stale(_) => Self::NotFound,
            other => Self::Internal(InternalError::Repository(other)),
        }
    }
}

impl From<IdentityProviderError> for UserServiceError {
    fn from(error: IdentityProviderError) -> Self {
        Self::Internal(InternalError::IdentityProvider(error))
    }
}
