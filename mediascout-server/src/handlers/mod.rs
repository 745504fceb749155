//! HTTP request handlers organized by functionality

pub mod handle_covers;
pub mod handle_directories;
pub mod handle_health;
pub mod handle_minidlna;
pub mod handle_movies;
pub mod handle_scan;

use std::path::PathBuf;

use base64::{
    Engine as _,
    engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD},
};

use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
};

/// Resolve a URL-safe base64 directory to one of the configured roots.
///
/// Anything that does not decode to a configured directory is forbidden.
pub fn resolve_directory(
    state: &AppState,
    directory_b64: &str,
) -> AppResult<PathBuf> {
    let encoded = directory_b64.trim();
    let bytes = URL_SAFE
        .decode(encoded)
        .or_else(|_| URL_SAFE_NO_PAD.decode(encoded))
        .map_err(|_| AppError::forbidden("Invalid directory"))?;
    let directory = String::from_utf8(bytes)
        .map_err(|_| AppError::forbidden("Invalid directory"))?;

    state
        .configured_directory(&directory)
        .cloned()
        .ok_or_else(|| AppError::forbidden("Directory not allowed"))
}

/// URL-safe base64 for a directory path, as accepted by the scan routes.
pub fn encode_directory(directory: &str) -> String {
    URL_SAFE.encode(directory.as_bytes())
}

async fn blocking<T, F>(task: F) -> AppResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| AppError::internal(format!("background task failed: {e}")))
}
