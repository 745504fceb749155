use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::Deserialize;
use tracing::info;

use mediascout_core::{CandidateSets, model::ScanReport, scanner};

use super::{blocking, resolve_directory};
use crate::infra::{app_state::AppState, errors::AppResult};

#[derive(Debug, Deserialize)]
pub struct CandidatesRequest {
    pub directory_b64: String,
}

/// Needs-cover files in one configured directory with their parsed titles.
pub async fn scan_directory_handler(
    State(state): State<AppState>,
    Path(directory_b64): Path<String>,
) -> AppResult<Json<ScanReport>> {
    let directory = resolve_directory(&state, &directory_b64)?;
    let extensions = state.extensions.clone();
    let parser = state.workflow.parser().clone();

    let report = blocking(move || {
        scanner::scan_report(&directory, &extensions, &parser)
    })
    .await??;

    Ok(Json(report))
}

/// Scan a configured directory and look up candidates for every file.
pub async fn candidates_handler(
    State(state): State<AppState>,
    Json(request): Json<CandidatesRequest>,
) -> AppResult<Json<CandidateSets>> {
    let directory = resolve_directory(&state, &request.directory_b64)?;
    info!("Building candidates for {}", directory.display());

    let sets = state
        .workflow
        .candidates_for_directory(&directory, &state.extensions)
        .await?;

    Ok(Json(sets))
}
