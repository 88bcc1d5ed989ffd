use thiserror::Error;

use refresh_athena::AthenaError;
use refresh_core::ConfigError;
use refresh_storage::{GrantError, StorageError};

/// Any failure of an invocation. Nothing is retried; the first error ends the run.
#[derive(Error, Debug)]
pub enum RefreshError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("query service error: {0}")]
    Query(#[from] AthenaError),

    #[error("permission grant error: {0}")]
    Grant(#[from] GrantError),
}
