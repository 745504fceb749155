use axum::{extract::State, response::Json};
use serde::Serialize;

use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
    minidlna::MinidlnaError,
};

#[derive(Debug, Serialize)]
pub struct RescanResponse {
    pub message: &'static str,
}

/// Ask Portainer to restart minidlna so it picks up new covers.
pub async fn trigger_minidlna_handler(
    State(state): State<AppState>,
) -> AppResult<Json<RescanResponse>> {
    let client = state
        .minidlna
        .as_ref()
        .ok_or_else(|| AppError::from(MinidlnaError::NotConfigured))?;
    client.trigger_rescan().await?;

    Ok(Json(RescanResponse {
        message: "Minidlna rescan triggered successfully",
    }))
}
