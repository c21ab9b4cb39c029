//! Axum route handlers for the Adaptation API.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;

use crate::adaptation::pipeline::{adapt_content, AdaptedContent};
use crate::errors::AppError;
use crate::models::job::JobAnalysis;
use crate::models::profile::Experience;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AdaptRequest {
    pub experiences: Vec<Experience>,
    #[serde(default)]
    pub job_analysis: JobAnalysis,
    #[serde(default)]
    pub directive: Option<String>,
}

/// POST /api/v1/adaptations
///
/// Rewords the submitted experiences toward the analysed job. Returns the input
/// unchanged when generation is switched off. A body that does not parse is a
/// 400 with the usual JSON error envelope.
pub async fn handle_adapt(
    State(state): State<AppState>,
    payload: Result<Json<AdaptRequest>, JsonRejection>,
) -> Result<Json<AdaptedContent>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::Validation(e.body_text()))?;

    let content = adapt_content(
        state.generator.clone(),
        &request.experiences,
        &request.job_analysis,
        request.directive.as_deref(),
        state.adaptation_settings(),
    )
    .await?;

    Ok(Json(content))
}
