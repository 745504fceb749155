//! # Mediascout Server
//!
//! JSON control surface over the cover workflow: list configured
//! directories, scan one for files without covers, review TMDB candidates and
//! commit the operator's picks.

pub mod handlers;
pub mod infra;
pub mod routes;

pub use infra::app_state::AppState;
pub use infra::errors::{AppError, AppResult};
pub use routes::create_app;
