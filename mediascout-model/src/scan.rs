use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::{MediaFile, ParsedTitle};

/// Whether a directory lives on local storage or a network mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LocationType {
    /// Backed by a local block device.
    Local,
    /// An NFS, SMB or similar network mount.
    Network,
    /// The mount table could not tell.
    Unknown,
}

impl fmt::Display for LocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LocationType::Local => "local",
            LocationType::Network => "network",
            LocationType::Unknown => "unknown",
        })
    }
}

/// Overall state of a configured directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DirectoryStatus {
    /// Every media file already has a cover.
    Ok,
    /// At least one media file needs a cover.
    ActionNeeded,
    /// The directory could not be read.
    Error,
}

/// Summary of one configured directory, as listed on the overview page.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DirectoryStats {
    /// The configured root.
    pub directory: PathBuf,
    /// Eligible media files below the root.
    pub total_files: usize,
    /// Media files without a `{stem}.jpg`.
    pub missing_covers: usize,
    /// Most recent modification time among the media files.
    pub last_modified: Option<DateTime<Utc>>,
    /// Derived from `missing_covers`, or `Error` when unreadable.
    pub status: DirectoryStatus,
    /// Local disk or network mount.
    pub location_type: LocationType,
    /// Whether a cover could be created in the root.
    pub is_writable: bool,
    /// Why the directory could not be read.
    pub error: Option<String>,
}

impl DirectoryStats {
    /// Stats for a directory that could not be read.
    pub fn failed(
        directory: PathBuf,
        location_type: LocationType,
        error: impl Into<String>,
    ) -> Self {
        Self {
            directory,
            total_files: 0,
            missing_covers: 0,
            last_modified: None,
            status: DirectoryStatus::Error,
            location_type,
            is_writable: false,
            error: Some(error.into()),
        }
    }
}

/// A needs-cover file together with the title inferred from its stem.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScannedFile {
    /// The file lacking a cover.
    pub media_file: MediaFile,
    /// Title and year inferred from the stem.
    pub parsed: ParsedTitle,
}

/// Point-in-time result of scanning one directory.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScanReport {
    /// The scanned root.
    pub directory: PathBuf,
    /// Eligible media files seen, with or without covers.
    pub total_files: usize,
    /// Count of entries in `files`.
    pub missing_covers: usize,
    /// Needs-cover files in walk order.
    pub files: Vec<ScannedFile>,
    /// When the walk finished.
    pub scanned_at: DateTime<Utc>,
}
