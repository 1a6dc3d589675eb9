//! Home and examples pages

use axum::{extract::State, response::Html, Extension};
use trafficnet_common::api::Identity;

use crate::error::LabelerResult;
use crate::render;
use crate::AppState;

/// GET /
pub async fn home_page(
    State(state): State<AppState>,
    identity: Option<Extension<Identity>>,
) -> LabelerResult<Html<String>> {
    let progress = state.store.review_progress().await?;
    let username = identity
        .map(|Extension(identity)| identity.username)
        .unwrap_or_default();

    Ok(Html(render::home_page(
        &state.settings.workplaces,
        &progress,
        &username,
    )))
}

/// GET /examples
pub async fn examples_page(State(state): State<AppState>) -> Html<String> {
    Html(render::examples_page(&state.settings.workplaces))
}
