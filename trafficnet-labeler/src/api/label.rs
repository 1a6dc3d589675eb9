//! `/label/:workplace` page and submission endpoint

use axum::{
    body::Bytes,
    extract::{Path, State},
    response::Html,
};
use tracing::debug;
use trafficnet_common::config::WorkplaceConfig;

use crate::error::{LabelerError, LabelerResult};
use crate::render;
use crate::services::LabelSubmission;
use crate::AppState;

fn find_workplace<'a>(state: &'a AppState, id: &str) -> LabelerResult<&'a WorkplaceConfig> {
    state
        .settings
        .workplace(id)
        .ok_or_else(|| LabelerError::NotFound(format!("Unknown workplace: {}", id)))
}

/// GET /label/:workplace
///
/// Renders one random unreviewed sample, or the exhaustion notice.
pub async fn label_page(
    State(state): State<AppState>,
    Path(workplace): Path<String>,
) -> LabelerResult<Html<String>> {
    let workplace = find_workplace(&state, &workplace)?;
    let workplaces = &state.settings.workplaces;

    let page = match state.provider.next_sample().await? {
        Some(sample) => render::label_page(workplaces, workplace, &sample),
        None => render::exhausted_page(workplaces, workplace),
    };
    Ok(Html(page))
}

/// POST /label/:workplace
///
/// Body is parsed here rather than with `Json` so malformed input gets a
/// plain-text 400 regardless of content type.
pub async fn submit_labels(
    State(state): State<AppState>,
    Path(workplace): Path<String>,
    body: Bytes,
) -> LabelerResult<&'static str> {
    let workplace = find_workplace(&state, &workplace)?;

    let submission: LabelSubmission =
        serde_json::from_slice(&body).map_err(|e| LabelerError::BadRequest(e.to_string()))?;
    debug!(
        workplace = %workplace.id,
        image_id = %submission.image_id,
        obstructed = submission.obstructed,
        "Received submission"
    );

    let outcome = state.submissions.submit(workplace, &submission).await?;
    Ok(outcome.message())
}
