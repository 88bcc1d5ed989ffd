use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {key}")]
    Missing { key: String },

    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    /// The env key this error refers to.
    pub fn key(&self) -> &str {
        match self {
            ConfigError::Missing { key } | ConfigError::Invalid { key, .. } => key,
        }
    }
}
