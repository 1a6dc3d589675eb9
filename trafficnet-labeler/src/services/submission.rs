//! Submission Handler
//!
//! Validates a label set against the workplace's schema and applies it to the
//! matching record in one conditional update. Obstructed submissions skip
//! label validation entirely.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;
use trafficnet_common::config::WorkplaceConfig;
use trafficnet_common::db::{LabelUpdate, SampleStore};

use crate::error::{LabelerError, LabelerResult};

pub const MISSING_LABELS_MESSAGE: &str = "Missing Labels - Please complete before submitting.";

/// POST body sent by the labeling page
///
/// Absent fields decode as empty so they fail validation rather than parsing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelSubmission {
    pub precipitation: String,
    /// Lane key (`left`, `center`, ...) to congestion category
    pub congestion: BTreeMap<String, String>,
    pub reviewer: String,
    #[serde(rename = "imageID")]
    pub image_id: String,
    pub obstructed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Labeled,
    Obstructed,
}

impl SubmissionOutcome {
    /// Confirmation text shown to the reviewer
    pub fn message(&self) -> &'static str {
        match self {
            SubmissionOutcome::Labeled => "Successful Submission, Thank you.",
            SubmissionOutcome::Obstructed => "Successfully marked sample as obstructed, Thank you.",
        }
    }
}

/// Validate a non-obstructed submission and build the fields to write
pub fn build_label_update(
    workplace: &WorkplaceConfig,
    submission: &LabelSubmission,
) -> LabelerResult<LabelUpdate> {
    let schema = &workplace.schema;

    let precipitation = submission.precipitation.trim();
    let lane_values: Vec<_> = schema
        .lanes
        .iter()
        .map(|lane| {
            let value = submission
                .congestion
                .get(&lane.key)
                .map(|v| v.trim())
                .unwrap_or_default();
            (lane, value)
        })
        .collect();

    let mut missing = Vec::new();
    if precipitation.is_empty() {
        missing.push("Precipitation".to_string());
    }
    missing.extend(
        lane_values
            .iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(lane, _)| lane.title.clone()),
    );
    if !missing.is_empty() {
        return Err(LabelerError::Validation(format!(
            "{} (missing: {})",
            MISSING_LABELS_MESSAGE,
            missing.join(", ")
        )));
    }

    if let Some(unknown) = submission
        .congestion
        .keys()
        .find(|key| schema.lane(key).is_none())
    {
        return Err(LabelerError::Validation(format!(
            "Unknown lane '{}' for workplace {}",
            unknown, workplace.id
        )));
    }

    if !schema.precipitation.iter().any(|p| p == precipitation) {
        return Err(LabelerError::Validation(format!(
            "Unknown precipitation label '{}'",
            precipitation
        )));
    }
    for (lane, value) in &lane_values {
        if !schema.congestion.iter().any(|c| c == value) {
            return Err(LabelerError::Validation(format!(
                "Unknown congestion label '{}' for {}",
                value, lane.title
            )));
        }
    }

    if submission.image_id.trim().is_empty() {
        return Err(LabelerError::Validation("Missing sample identifier".to_string()));
    }

    let reviewer = match submission.reviewer.trim() {
        "" => workplace.reviewer.clone(),
        given => given.to_string(),
    };

    let mut fields = vec![("labels.precipitation".to_string(), precipitation.to_string())];
    fields.extend(
        lane_values
            .iter()
            .map(|(lane, value)| (lane.field_path(), value.to_string())),
    );

    Ok(LabelUpdate { reviewer, fields })
}

#[derive(Clone)]
pub struct SubmissionHandler {
    store: SampleStore,
}

impl SubmissionHandler {
    pub fn new(store: SampleStore) -> Self {
        Self { store }
    }

    /// Apply one submission; nothing is written unless validation passes
    pub async fn submit(
        &self,
        workplace: &WorkplaceConfig,
        submission: &LabelSubmission,
    ) -> LabelerResult<SubmissionOutcome> {
        let image_id = submission.image_id.trim();

        if submission.obstructed {
            if image_id.is_empty() {
                return Err(LabelerError::Validation("Missing sample identifier".to_string()));
            }
            let reviewer = Some(submission.reviewer.trim()).filter(|r| !r.is_empty());

            if self.store.mark_obstructed(image_id, reviewer).await? == 0 {
                return Err(self.unmatched(image_id).await);
            }
            info!(workplace = %workplace.id, blob_id = %image_id, "Sample marked obstructed");
            return Ok(SubmissionOutcome::Obstructed);
        }

        let update = build_label_update(workplace, submission)?;
        if self.store.apply_labels(image_id, &update).await? == 0 {
            return Err(self.unmatched(image_id).await);
        }

        info!(
            workplace = %workplace.id,
            blob_id = %image_id,
            reviewer = %update.reviewer,
            "Sample labeled"
        );
        Ok(SubmissionOutcome::Labeled)
    }

    /// Explain why a conditional update matched nothing
    async fn unmatched(&self, image_id: &str) -> LabelerError {
        match self.store.find_by_blob_id(image_id).await {
            Ok(Some(_)) => {
                LabelerError::Conflict(format!("Sample {} has already been reviewed", image_id))
            }
            Ok(None) => LabelerError::NotFound(format!("No sample with id {}", image_id)),
            Err(e) => e.into(),
        }
    }
}
