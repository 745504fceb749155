//! # Mediascout Core
//!
//! Finds video files that have no cover image, works out which movie each one
//! is from its filename, looks candidates up on TMDB and writes the chosen
//! poster next to the file as a small square JPEG.
//!
//! ## Architecture
//!
//! - [`parser`]: filename stem → title and year, driven by an ordered tag table
//! - [`scanner`]: recursive walk listing media files without a `{stem}.jpg`
//! - [`metadata`]: TMDB client behind the [`MetadataProvider`] trait, with a
//!   shared sliding-window rate limiter and candidate ranking
//! - [`cover`]: artwork download, center-crop, resize and atomic write
//! - [`workflow`]: ties the above together per operator request
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use mediascout_core::{
//!     CoverSettings, CoverWriter, HttpArtworkSource, SelectionWorkflow,
//!     TitleParser, TmdbClient, TmdbSettings, WorkflowOptions,
//! };
//!
//! # async fn run() -> mediascout_core::Result<()> {
//! let tmdb = TmdbClient::new(TmdbSettings::new("api-key"))?;
//! let artwork = HttpArtworkSource::new(Duration::from_secs(15))?;
//! let workflow = SelectionWorkflow::new(
//!     TitleParser::default(),
//!     Arc::new(tmdb),
//!     CoverWriter::new(Arc::new(artwork), CoverSettings::default()),
//!     WorkflowOptions::default(),
//! );
//!
//! let sets = workflow
//!     .candidates_for_directory(Path::new("/srv/movies"), &["mkv".into()])
//!     .await?;
//! for set in sets.iter() {
//!     println!("{} -> {} candidates", set.parsed, set.candidates.len());
//! }
//! # Ok(())
//! # }
//! ```

/// Cover download, resize and storage.
pub mod cover;
/// Error type shared by every stage.
pub mod error;
/// Metadata service clients.
pub mod metadata;
/// Title inference from filenames.
pub mod parser;
/// Directory walking and statistics.
pub mod scanner;
/// Request-scoped orchestration.
pub mod workflow;

pub use cover::{
    ArtworkSource, CoverSettings, CoverWriter, HttpArtworkSource,
    encode_cover_jpeg,
};
pub use error::{Result, ScoutError};
pub use metadata::{
    MetadataProvider, RateLimitRule, RateLimitSnapshot, RateLimiter,
    RetryPolicy, TmdbClient, TmdbSettings,
};
pub use parser::{TitleParser, parse};
pub use workflow::{
    CandidateSet, CandidateSets, FileState, SelectionWorkflow, WorkflowOptions,
};

pub use mediascout_model as model;

/// Sent with every outbound HTTP request.
pub const USER_AGENT: &str =
    concat!("mediascout/", env!("CARGO_PKG_VERSION"));
