//! Refresh worker: wires configuration, S3 and Athena together for one
//! invocation of the reporting-dataset refresh.

pub mod aws;
pub mod error;
pub mod handler;
pub mod orchestrator;

pub use error::RefreshError;
pub use handler::{handle, handle_object_created, handle_with, InvocationContext};
pub use orchestrator::{refresh, RefreshReport};
