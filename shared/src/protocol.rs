use serde::{Deserialize, Serialize};

/// Envelope for every successful response, and for the upstream
/// count endpoints which report their own `success` flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseWrapper<T> {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub data: Option<T>,
}

impl<T> ResponseWrapper<T> {
    pub fn ok(status_code: u16, message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            status_code: Some(status_code),
            data: Some(data),
        }
    }
}

/// Envelope for every failed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionWrapper {
    pub success: bool,
    pub message: String,
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_exceptions: Option<Vec<ValidationExceptionWrapper>>,
}

impl ExceptionWrapper {
    pub fn new(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            status_code,
            error_count: None,
            validation_exceptions: None,
        }
    }

    pub fn with_violations(mut self, violations: Vec<ValidationExceptionWrapper>) -> Self {
        self.error_count = Some(violations.len());
        self.validation_exceptions = Some(violations);
        self
    }
}

/// One rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationExceptionWrapper {
    pub error_field: String,
    pub rejected_value: Option<String>,
    pub reason: String,
}
