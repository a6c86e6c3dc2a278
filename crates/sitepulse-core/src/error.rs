use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// A required ingest field was missing or malformed.
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
}

impl CoreError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}
