use std::path::PathBuf;

use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use mediascout_core::model::{
    Candidate, MediaFile, Outcome, OutcomeStatus, Selection,
};
use mediascout_core::scanner::is_within_roots;

use super::blocking;
use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
};

#[derive(Debug, Deserialize)]
pub struct SaveCoversRequest {
    #[serde(default)]
    pub selections: Vec<SelectionRequest>,
}

#[derive(Debug, Deserialize)]
pub struct SelectionRequest {
    pub path: PathBuf,
    /// Absent means the operator skipped the file.
    #[serde(default)]
    pub candidate: Option<Candidate>,
}

#[derive(Debug, Serialize)]
pub struct SaveCoversResponse {
    pub written: usize,
    pub failed: usize,
    pub skipped: usize,
    pub outcomes: Vec<Outcome>,
}

impl SaveCoversResponse {
    fn from_outcomes(outcomes: Vec<Outcome>) -> Self {
        let count = |status: OutcomeStatus| {
            outcomes.iter().filter(|o| o.status == status).count()
        };
        Self {
            written: count(OutcomeStatus::Written),
            failed: count(OutcomeStatus::Failed),
            skipped: count(OutcomeStatus::Skipped),
            outcomes,
        }
    }
}

/// Write the chosen covers. Outcomes come back in request order; a file that
/// fails validation or writing is reported without failing the batch.
pub async fn save_covers_handler(
    State(state): State<AppState>,
    Json(request): Json<SaveCoversRequest>,
) -> AppResult<Json<SaveCoversResponse>> {
    let mut media_files = Vec::with_capacity(request.selections.len());
    for selection in request.selections {
        let media_file = MediaFile::from_path(&selection.path).map_err(|e| {
            AppError::bad_request(format!(
                "Invalid media path {}: {e}",
                selection.path.display()
            ))
        })?;
        media_files.push((media_file, selection.candidate));
    }

    let roots = state.directories.clone();
    let extensions = state.extensions.clone();
    let checked = blocking(move || {
        media_files
            .into_iter()
            .map(|(media_file, candidate)| {
                check_selection(media_file, candidate, &roots, &extensions)
            })
            .collect::<Vec<_>>()
    })
    .await?;

    let mut slots = Vec::with_capacity(checked.len());
    let mut accepted = Vec::new();
    for result in checked {
        match result {
            Ok(selection) => {
                slots.push(None);
                accepted.push(selection);
            }
            Err(outcome) => slots.push(Some(outcome)),
        }
    }

    let cancel = state.shutdown.child_token();
    let mut applied = state
        .workflow
        .apply_selections(accepted, &cancel)
        .await
        .into_iter();
    let outcomes: Vec<Outcome> = slots
        .into_iter()
        .filter_map(|slot| slot.or_else(|| applied.next()))
        .collect();

    let response = SaveCoversResponse::from_outcomes(outcomes);
    info!(
        "Saved covers: {} written, {} failed, {} skipped",
        response.written, response.failed, response.skipped
    );
    Ok(Json(response))
}

fn check_selection(
    media_file: MediaFile,
    candidate: Option<Candidate>,
    roots: &[PathBuf],
    extensions: &[String],
) -> Result<Selection, Outcome> {
    let reason = if !media_file.has_extension_in(extensions) {
        Some("extension not allowed")
    } else if !media_file.path.is_file() {
        Some("media file not found")
    } else if !is_within_roots(&media_file.path, roots) {
        Some("outside configured directories")
    } else {
        None
    };

    if let Some(reason) = reason {
        warn!("Rejected selection for {}: {}", media_file, reason);
        let message = format!("{}: {}", media_file.file_name(), reason);
        return Err(Outcome::failed(media_file, message));
    }

    Ok(match candidate {
        Some(candidate) => Selection::chosen(media_file, candidate),
        None => Selection::skipped(media_file),
    })
}
