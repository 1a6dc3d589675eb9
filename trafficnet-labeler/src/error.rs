//! Error types for trafficnet-labeler
//!
//! All user-visible errors are plain-text bodies; there are no structured
//! error codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use crate::blob::BlobError;

/// Request-level error type
#[derive(Debug, Error)]
pub enum LabelerError {
    /// Incomplete or invalid label submission; nothing was written
    #[error("{0}")]
    Validation(String),

    /// Request body could not be parsed
    #[error("Malformed submission: {0}")]
    BadRequest(String),

    /// Unknown workplace or sample identifier
    #[error("{0}")]
    NotFound(String),

    /// Sample already left the eligible pool
    #[error("{0}")]
    Conflict(String),

    /// Blob storage unreachable or returned an error
    #[error("Blob storage error: {0}")]
    Blob(#[from] BlobError),

    /// Database or other shared-layer failure
    #[error("{0}")]
    Common(#[from] trafficnet_common::Error),
}

impl LabelerError {
    pub fn status(&self) -> StatusCode {
        match self {
            // Incomplete labels are reported as 500, matching what the labeling page expects
            LabelerError::Validation(_) => StatusCode::INTERNAL_SERVER_ERROR,
            LabelerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            LabelerError::NotFound(_) => StatusCode::NOT_FOUND,
            LabelerError::Conflict(_) => StatusCode::CONFLICT,
            LabelerError::Blob(_) | LabelerError::Common(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for LabelerError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            LabelerError::Blob(_) | LabelerError::Common(_) => {
                error!(error = %self, "Upstream failure");
            }
            _ => warn!(status = status.as_u16(), error = %self, "Request rejected"),
        }

        (status, self.to_string()).into_response()
    }
}

/// Result type for request handlers
pub type LabelerResult<T> = Result<T, LabelerError>;
