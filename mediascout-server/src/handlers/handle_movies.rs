use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::{Deserialize, Serialize};

use mediascout_core::model::{Candidate, ParsedTitle, PosterOption};

use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
};

#[derive(Debug, Deserialize)]
pub struct SearchMovieRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub year: Option<u16>,
}

#[derive(Debug, Serialize)]
pub struct SearchMovieResponse {
    pub results: Vec<Candidate>,
}

#[derive(Debug, Serialize)]
pub struct MovieDetailsResponse {
    pub movie: Candidate,
    pub posters: Vec<PosterOption>,
}

/// Free-text search for when the filename guess was wrong.
pub async fn search_movie_handler(
    State(state): State<AppState>,
    Json(request): Json<SearchMovieRequest>,
) -> AppResult<Json<SearchMovieResponse>> {
    let query = ParsedTitle::new(request.title.trim(), request.year);
    if query.is_blank() {
        return Err(AppError::bad_request("No title provided"));
    }

    let results = state.workflow.search(&query).await?;
    Ok(Json(SearchMovieResponse { results }))
}

pub async fn movie_details_handler(
    State(state): State<AppState>,
    Path(movie_id): Path<u64>,
) -> AppResult<Json<MovieDetailsResponse>> {
    if movie_id == 0 {
        return Err(AppError::bad_request("Invalid movie ID"));
    }

    let (movie, posters) = state.workflow.movie_with_posters(movie_id).await?;
    Ok(Json(MovieDetailsResponse { movie, posters }))
}
