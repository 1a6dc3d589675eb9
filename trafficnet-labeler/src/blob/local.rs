//! Directory-backed blob store for development and offline review
//!
//! Blob `<id>` is the file `<root>/<id>`.

use async_trait::async_trait;
use std::path::PathBuf;

use super::{BlobError, BlobStore};

pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, BlobError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(BlobError::Config(format!(
                "Blob directory not found: {}",
                root.display()
            )));
        }
        Ok(Self { root })
    }
}

/// Ids must name a file directly inside the root
fn is_plain_file_name(blob_id: &str) -> bool {
    !blob_id.is_empty()
        && blob_id != "."
        && blob_id != ".."
        && !blob_id.contains(&['/', '\\', '\0'][..])
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn fetch(&self, blob_id: &str) -> Result<Vec<u8>, BlobError> {
        if !is_plain_file_name(blob_id) {
            return Err(BlobError::NotFound(blob_id.to_string()));
        }

        match tokio::fs::read(self.root.join(blob_id)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BlobError::NotFound(blob_id.to_string()))
            }
            Err(e) => Err(BlobError::Io(e)),
        }
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_file_by_id() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cam-01.jpg"), b"\xFF\xD8\xFFjpeg").unwrap();

        let store = LocalBlobStore::new(dir.path()).unwrap();
        assert_eq!(store.fetch("cam-01.jpg").await.unwrap(), b"\xFF\xD8\xFFjpeg");
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path()).unwrap();
        assert!(matches!(store.fetch("nope.jpg").await, Err(BlobError::NotFound(_))));
    }

    #[tokio::test]
    async fn rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path()).unwrap();
        for id in ["..", "../secret", "a/b", "", "a\\b"] {
            assert!(
                matches!(store.fetch(id).await, Err(BlobError::NotFound(_))),
                "{id:?} should be rejected"
            );
        }
    }

    #[test]
    fn root_must_exist() {
        assert!(matches!(
            LocalBlobStore::new("/nonexistent/trafficnet-blobs"),
            Err(BlobError::Config(_))
        ));
    }
}
