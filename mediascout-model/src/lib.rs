//! Core data model definitions shared across Mediascout crates.
//!
//! Everything in here is a plain value type. Nothing is persisted: media files,
//! candidates and selections live for the duration of one operator request.

/// Metadata search results.
pub mod candidate;
/// Model errors.
pub mod error;
/// Media files and their cover paths.
pub mod files;
/// Directory summaries and scan reports.
pub mod scan;
/// Operator selections and per-file outcomes.
pub mod selection;
/// Titles inferred from filenames.
pub mod titles;

pub use candidate::{Candidate, PosterOption};
pub use error::{ModelError, Result as ModelResult};
pub use files::{COVER_EXTENSION, MediaFile};
pub use scan::{
    DirectoryStats, DirectoryStatus, LocationType, ScanReport, ScannedFile,
};
pub use selection::{Outcome, OutcomeStatus, Selection};
pub use titles::ParsedTitle;
