//! Errors raised while encoding, decoding and navigating values

#[derive(Debug, thiserror::Error)]
pub enum TfplugError {
    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),

    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("Attribute not found: {0}")]
    AttributeNotFound(String),

    /// The path does not address a settable location in the value
    #[error("Invalid attribute path: {0}")]
    InvalidPath(String),
}

pub type Result<T> = std::result::Result<T, TfplugError>;
