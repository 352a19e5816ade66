use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{health_check, index, lookup_json, submit_form, AppState};
use super::template::PageTemplate;
use crate::lookup::LookupService;

pub fn create_router(service: LookupService, template: PageTemplate) -> Router {
    let state = Arc::new(AppState { service, template });

    Router::new()
        .route("/", get(index).post(submit_form))
        .route("/api/lookup", post(lookup_json))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
