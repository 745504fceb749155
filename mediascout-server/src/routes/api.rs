use axum::{
    Router,
    routing::{get, post},
};

use crate::handlers::{
    handle_covers::save_covers_handler,
    handle_directories::list_directories_handler,
    handle_minidlna::trigger_minidlna_handler,
    handle_movies::{movie_details_handler, search_movie_handler},
    handle_scan::{candidates_handler, scan_directory_handler},
};
use crate::infra::app_state::AppState;

pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/directories", get(list_directories_handler))
        .route("/scan/{directory_b64}", get(scan_directory_handler))
        .route("/candidates", post(candidates_handler))
        .route("/search-movie", post(search_movie_handler))
        .route("/movies/{id}", get(movie_details_handler))
        .route("/save-covers", post(save_covers_handler))
        .route("/trigger-minidlna", post(trigger_minidlna_handler))
}
