//! Sample Provider
//!
//! Draws one unreviewed record at random and resolves its image from blob
//! storage. Selection does not reserve the record: two reviewers loading the
//! page at the same time may be shown the same sample.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::sync::Arc;
use tracing::{debug, info};
use trafficnet_common::db::SampleStore;

use crate::blob::BlobStore;
use crate::error::LabelerResult;

/// MIME type declared when the bytes are not a recognized image format
const FALLBACK_MIME: &str = "image/jpeg";

/// One sample ready for display
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Blob id, echoed back as `imageID` on submission
    pub image_id: String,
    pub image_name: String,
    /// `data:<mime>;base64,<payload>`
    pub image_content: String,
}

#[derive(Clone)]
pub struct SampleProvider {
    store: SampleStore,
    blobs: Arc<dyn BlobStore>,
}

impl SampleProvider {
    pub fn new(store: SampleStore, blobs: Arc<dyn BlobStore>) -> Self {
        Self { store, blobs }
    }

    /// Next sample to label, or `None` once the dataset is exhausted
    pub async fn next_sample(&self) -> LabelerResult<Option<Sample>> {
        let Some(record) = self.store.random_unreviewed().await? else {
            info!(collection = %self.store.collection(), "No unreviewed samples remain");
            return Ok(None);
        };

        debug!(blob_id = %record.blob_id, backend = self.blobs.name(), "Fetching sample image");
        let bytes = self.blobs.fetch(&record.blob_id).await?;

        info!(
            blob_id = %record.blob_id,
            bytes = bytes.len(),
            "Serving sample"
        );

        Ok(Some(Sample {
            image_id: record.blob_id,
            image_name: record.display_name.unwrap_or_default(),
            image_content: encode_data_uri(&bytes),
        }))
    }
}

/// Encode image bytes as a data URI, sniffing the MIME type from the content
pub fn encode_data_uri(bytes: &[u8]) -> String {
    let mime = infer::get(bytes)
        .map(|kind| kind.mime_type())
        .filter(|mime| mime.starts_with("image/"))
        .unwrap_or(FALLBACK_MIME);
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_bytes_declare_png() {
        let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
        assert!(encode_data_uri(png).starts_with("data:image/png;base64,"));
    }

    #[test]
    fn jpeg_bytes_declare_jpeg() {
        let jpeg = b"\xFF\xD8\xFF\xE0\0\x10JFIF\0";
        assert!(encode_data_uri(jpeg).starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn unknown_bytes_fall_back_to_jpeg() {
        assert_eq!(encode_data_uri(b"abc"), "data:image/jpeg;base64,YWJj");
    }

    #[test]
    fn non_image_types_fall_back_to_jpeg() {
        let pdf = b"%PDF-1.4\n";
        assert!(encode_data_uri(pdf).starts_with("data:image/jpeg;base64,"));
    }
}
