use axum::{extract::State, response::Html, Form, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::template::PageTemplate;
use crate::lookup::{split_addresses, LookupReport, LookupService};

pub struct AppState {
    pub service: LookupService,
    pub template: PageTemplate,
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub message: String,
}

/// Form body posted by the lookup page
#[derive(Debug, Deserialize)]
pub struct LookupForm {
    #[serde(rename = "ipsInput", default)]
    pub ips_input: String,
}

/// Addresses either as one whitespace separated string or as a list
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AddressInput {
    Text(String),
    List(Vec<String>),
}

impl AddressInput {
    pub fn into_tokens(self) -> Vec<String> {
        match self {
            AddressInput::Text(text) => split_addresses(&text),
            AddressInput::List(list) => list
                .iter()
                .flat_map(|item| split_addresses(item))
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LookupRequest {
    pub addresses: AddressInput,
}

/// Blank lookup form
pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(state.template.render(None))
}

/// Run a lookup submitted from the form and render the results page
pub async fn submit_form(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LookupForm>,
) -> Html<String> {
    let report = state.service.lookup_text(&form.ips_input).await;
    Html(state.template.render(Some(&report)))
}

/// JSON variant of the lookup
pub async fn lookup_json(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LookupRequest>,
) -> Json<LookupReport> {
    let addresses = payload.addresses.into_tokens();
    Json(state.service.lookup(&addresses).await)
}

/// Health check endpoint
pub async fn health_check() -> Json<SuccessResponse> {
    Json(SuccessResponse {
        message: "OK".to_string(),
    })
}
