//! Blob storage backends holding the raw image bytes
//!
//! Records reference images by an opaque blob id; a [`BlobStore`] resolves
//! that id to bytes.

use async_trait::async_trait;
use thiserror::Error;

mod box_client;
mod local;

pub use box_client::{BoxAppConfig, BoxBlobStore};
pub use local::LocalBlobStore;

/// Blob storage errors
#[derive(Debug, Error)]
pub enum BlobError {
    /// Network communication error
    #[error("Network error: {0}")]
    Network(String),

    /// No blob with this id
    #[error("Blob not found: {0}")]
    NotFound(String),

    /// Storage API returned an error response
    #[error("API error {0}: {1}")]
    Api(u16, String),

    /// Token exchange rejected
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Credentials could not be decoded
    #[error("Invalid blob storage configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Download the full content of one blob
    async fn fetch(&self, blob_id: &str) -> Result<Vec<u8>, BlobError>;

    /// Backend name for logs
    fn name(&self) -> &'static str;
}
