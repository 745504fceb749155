use std::fmt;
use std::path::PathBuf;

use crate::{Candidate, MediaFile};

/// An operator decision for one media file.
///
/// `chosen_candidate == None` means the operator skipped the file.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Selection {
    /// The file the decision is about.
    pub media_file: MediaFile,
    /// The candidate whose poster becomes the cover.
    pub chosen_candidate: Option<Candidate>,
}

impl Selection {
    /// The operator picked `candidate` for this file.
    pub fn chosen(media_file: MediaFile, candidate: Candidate) -> Self {
        Self {
            media_file,
            chosen_candidate: Some(candidate),
        }
    }

    /// The operator left this file without a cover.
    pub fn skipped(media_file: MediaFile) -> Self {
        Self {
            media_file,
            chosen_candidate: None,
        }
    }
}

/// How applying a selection ended for one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OutcomeStatus {
    /// A cover now exists next to the media file.
    Written,
    /// Fetching, encoding or writing the cover failed.
    Failed,
    /// Nothing was written, on request or because of cancellation.
    Skipped,
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OutcomeStatus::Written => "written",
            OutcomeStatus::Failed => "failed",
            OutcomeStatus::Skipped => "skipped",
        };
        f.write_str(label)
    }
}

/// Per-file result of applying a selection.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Outcome {
    /// The file the outcome is for.
    pub media_file: MediaFile,
    /// How it ended.
    pub status: OutcomeStatus,
    /// Failure message, or the reason a file was skipped.
    pub error: Option<String>,
    /// Where the cover was written.
    pub cover_path: Option<PathBuf>,
}

impl Outcome {
    /// A cover was stored at `cover_path`.
    pub fn written(media_file: MediaFile, cover_path: PathBuf) -> Self {
        Self {
            media_file,
            status: OutcomeStatus::Written,
            error: None,
            cover_path: Some(cover_path),
        }
    }

    /// The file failed with `error`.
    pub fn failed(media_file: MediaFile, error: impl Into<String>) -> Self {
        Self {
            media_file,
            status: OutcomeStatus::Failed,
            error: Some(error.into()),
            cover_path: None,
        }
    }

    /// Nothing was written, optionally with a reason.
    pub fn skipped(media_file: MediaFile, reason: Option<String>) -> Self {
        Self {
            media_file,
            status: OutcomeStatus::Skipped,
            error: reason,
            cover_path: None,
        }
    }

    /// Whether a cover was written.
    pub fn is_written(&self) -> bool {
        self.status == OutcomeStatus::Written
    }
}
