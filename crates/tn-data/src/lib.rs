//! Data plumbing for the taxon navigator: loaders, backend rows, configuration

pub mod cache;
pub mod config;
pub mod rows;
pub mod sources;

use thiserror::Error;

// Re-exports
pub use cache::CachedLoader;
pub use config::NavigatorConfig;
pub use rows::decode_rows;
pub use sources::MemoryTaxonomy;

/// Errors that can occur in data operations
#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected payload: {0}")]
    Payload(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<tn_core::NavError> for DataError {
    fn from(error: tn_core::NavError) -> Self {
        DataError::Config(error.to_string())
    }
}
