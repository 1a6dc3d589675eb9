//! trafficnet-labeler library
//!
//! Web labeling tool for TrafficNet: reviewers behind a shared passkey are
//! shown random unreviewed highway camera images and submit congestion and
//! weather labels, recorded back into the sample store.

use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use trafficnet_common::api::GateCredentials;
use trafficnet_common::config::TomlConfig;
use trafficnet_common::db::SampleStore;

pub mod api;
pub mod blob;
pub mod config;
pub mod error;
pub mod render;
pub mod services;

use blob::BlobStore;
use services::{SampleProvider, SubmissionHandler};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Workplaces, label schemas and allow-list
    pub settings: Arc<TomlConfig>,
    pub store: SampleStore,
    pub provider: SampleProvider,
    pub submissions: SubmissionHandler,
    pub gate: Arc<GateCredentials>,
}

impl AppState {
    pub fn new(
        settings: TomlConfig,
        store: SampleStore,
        blobs: Arc<dyn BlobStore>,
        passkey: &str,
    ) -> Self {
        let gate = GateCredentials::new(passkey, &settings.allowed_users);
        Self {
            provider: SampleProvider::new(store.clone(), blobs),
            submissions: SubmissionHandler::new(store.clone()),
            store,
            gate: Arc::new(gate),
            settings: Arc::new(settings),
        }
    }
}

/// Build application router
///
/// Everything except `/health` sits behind the access gate.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::get;

    let protected = Router::new()
        .route("/", get(api::home_page))
        .route("/examples", get(api::examples_page))
        .route(
            "/label/:workplace",
            get(api::label_page).post(api::submit_labels),
        )
        .route("/api/buildinfo", get(api::get_build_info))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::gate_middleware,
        ));

    let public = Router::new().merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
