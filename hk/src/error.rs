//! Error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors from the local bundle: store, fetcher and query engine
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("No local bundle at {path}, fetch one with --get-bundle")]
    StoreMissing { path: PathBuf },

    #[error("Bundle at {path} is corrupt: {reason}")]
    StoreCorrupt { path: PathBuf, reason: String },

    #[error("Download failed for {url}: {reason}")]
    DownloadFailed { url: String, reason: String },

    #[error("Malformed bundle file {url}: {reason}")]
    ExtractFailed { url: String, reason: String },

    #[error("No sentence matches {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BundleError {
    /// Whether the error means "nothing matched" rather than a failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, BundleError::NotFound(_))
    }

    /// Whether falling back to the online API makes sense
    pub fn is_store_missing(&self) -> bool {
        matches!(self, BundleError::StoreMissing { .. })
    }
}

/// Errors from the online sentence API
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("API error {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("No API endpoint to call")]
    NoEndpoints,

    #[error("All API endpoints failed, last error: {0}")]
    Exhausted(Box<ApiError>),
}
