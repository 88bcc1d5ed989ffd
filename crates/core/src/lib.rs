pub mod config;
pub mod error;

pub use config::{load_dotenv, AclConfig, ExtractionConfig, LaunchMode};
pub use error::*;
