use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    /// An S3 call failed; `message` carries the SDK's full error context.
    #[error("S3 {operation} on {target} failed: {message}")]
    Sdk {
        operation: &'static str,
        target: String,
        message: String,
    },

    #[error("invalid access policy: {0}")]
    InvalidAcl(String),
}

impl StorageError {
    pub(crate) fn sdk(operation: &'static str, target: impl Into<String>, err: impl std::fmt::Display) -> Self {
        StorageError::Sdk {
            operation,
            target: target.into(),
            message: err.to_string(),
        }
    }
}
