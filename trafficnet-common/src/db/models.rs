//! Sample record models

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One traffic-camera image plus its metadata and label fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleRecord {
    /// Identifier into blob storage; immutable once created
    pub blob_id: String,
    pub display_name: Option<String>,
    /// `None` while the record is eligible for selection
    pub review_status: Option<ReviewStatus>,
    /// Nested label document, e.g. `{"precipitation": "rain", "congestion": {"leftLane": "vacant"}}`
    pub labels: Option<Value>,
    pub reviewer: Option<String>,
    pub obstructed: bool,
    pub reviewed_at: Option<String>,
}

impl SampleRecord {
    /// Read a dotted document path such as `labels.congestion.leftLane`
    pub fn label(&self, field_path: &str) -> Option<&str> {
        let mut parts = field_path.split('.');
        if parts.next() != Some("labels") {
            return None;
        }
        parts
            .try_fold(self.labels.as_ref()?, |node, key| node.get(key))?
            .as_str()
    }
}

/// Terminal state of a reviewed record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Labeled,
    Obstructed,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Labeled => "labeled",
            ReviewStatus::Obstructed => "obstructed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "labeled" => Some(ReviewStatus::Labeled),
            "obstructed" => Some(ReviewStatus::Obstructed),
            _ => None,
        }
    }
}

/// Label values to write, keyed by dotted document path
#[derive(Debug, Clone, PartialEq)]
pub struct LabelUpdate {
    pub reviewer: String,
    pub fields: Vec<(String, String)>,
}

/// Review counts for the whole collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReviewProgress {
    pub total: i64,
    pub labeled: i64,
    pub obstructed: i64,
}

impl ReviewProgress {
    pub fn remaining(&self) -> i64 {
        self.total - self.labeled - self.obstructed
    }
}
