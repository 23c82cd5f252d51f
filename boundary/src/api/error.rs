use thiserror::Error;

use super::common::ApiErrorDetails;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error (HTTP {status}, {kind}): {message}")]
    ApiError {
        status: u16,
        kind: String,
        message: String,
        #[source]
        details: Option<Box<ApiErrorDetails>>,
    },

    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The object changed since its version was last read
    #[error("Version conflict: {0}")]
    Conflict(String),

    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Request cancelled")]
    Cancelled,
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }

    /// Per-field errors reported by the server, if any
    pub fn field_errors(&self) -> &[super::common::RequestField] {
        match self {
            ApiError::ApiError {
                details: Some(details),
                ..
            } => &details.request_fields,
            _ => &[],
        }
    }
}

impl From<tfplug::TfplugError> for ApiError {
    fn from(err: tfplug::TfplugError) -> Self {
        ApiError::Validation(err.to_string())
    }
}
