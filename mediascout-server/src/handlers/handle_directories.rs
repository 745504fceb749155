use axum::{extract::State, response::Json};
use serde::Serialize;

use mediascout_core::model::DirectoryStats;
use mediascout_core::scanner::directory_stats;

use super::{blocking, encode_directory};
use crate::infra::{app_state::AppState, errors::AppResult};

#[derive(Debug, Serialize)]
pub struct DirectoryEntry {
    /// Key for `/api/scan/{directory_b64}`.
    pub directory_b64: String,
    #[serde(flatten)]
    pub stats: DirectoryStats,
}

#[derive(Debug, Serialize)]
pub struct DirectoriesResponse {
    pub directories: Vec<DirectoryEntry>,
}

/// Stats for every configured directory. A broken directory shows up with an
/// error status instead of failing the listing.
pub async fn list_directories_handler(
    State(state): State<AppState>,
) -> AppResult<Json<DirectoriesResponse>> {
    let directories = state.directories.clone();
    let extensions = state.extensions.clone();

    let directories = blocking(move || {
        directories
            .iter()
            .map(|directory| DirectoryEntry {
                directory_b64: encode_directory(&directory.to_string_lossy()),
                stats: directory_stats(directory, &extensions),
            })
            .collect::<Vec<_>>()
    })
    .await?;

    Ok(Json(DirectoriesResponse { directories }))
}
