//! GET /api/models - Enabled models a client can select.

use std::time::Instant;

use axum::extract::State;
use serde::Serialize;

use crate::http::response::ApiResponse;
use crate::state::AppState;

/// A selectable model.
#[derive(Debug, Serialize)]
pub struct ModelSummary {
    /// Qualified id (`provider:id`) to send as `model`.
    pub id: String,
    pub name: String,
    pub provider: String,
    pub reasoning: bool,
    /// Whether the model's provider is registered and can serve requests.
    pub available: bool,
}

pub async fn list_models(State(state): State<AppState>) -> ApiResponse<Vec<ModelSummary>> {
    let start = Instant::now();
    let models = state
        .config
        .enabled_models()
        .map(|model| ModelSummary {
            id: model.qualified_id(),
            name: model.name.clone(),
            provider: model.provider.clone(),
            reasoning: model.reasoning,
            available: state.registry.get(&model.provider).is_some(),
        })
        .collect();
    ApiResponse::success(models, start)
}
