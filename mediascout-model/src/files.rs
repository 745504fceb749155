use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{ModelError, Result};

/// Extension of the sibling cover image written next to each media file.
pub const COVER_EXTENSION: &str = "jpg";

/// A video file found during a directory scan.
///
/// Identity is the path. The stem and extension are captured once at scan time
/// so later stages never have to re-derive them from the path.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MediaFile {
    /// Absolute path of the video file.
    pub path: PathBuf,
    /// File name without the extension.
    pub stem: String,
    /// Extension as found on disk, without the dot.
    pub extension: String,
}

impl MediaFile {
    /// Capture stem and extension from `path`.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ModelError::MissingStem(path.clone()))?
            .to_string();
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ModelError::MissingExtension(path.clone()))?
            .to_string();

        Ok(Self {
            path,
            stem,
            extension,
        })
    }

    /// Directory holding the media file (and its cover).
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// `{stem}.{extension}`.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.stem, self.extension)
    }

    /// Where the cover for this file lives: `{directory}/{stem}.jpg`.
    pub fn cover_path(&self) -> PathBuf {
        self.directory()
            .join(format!("{}.{}", self.stem, COVER_EXTENSION))
    }

    /// Case-insensitive extension membership test.
    pub fn has_extension_in<S: AsRef<str>>(&self, extensions: &[S]) -> bool {
        extensions
            .iter()
            .any(|ext| ext.as_ref().eq_ignore_ascii_case(&self.extension))
    }
}

impl fmt::Debug for MediaFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaFile")
            .field("path", &self.path)
            .field("stem", &self.stem)
            .field("extension", &self.extension)
            .finish()
    }
}

impl fmt::Display for MediaFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_stem_and_extension() {
        let file =
            MediaFile::from_path("/media/movies/The.Matrix.1999.mkv").unwrap();
        assert_eq!(file.stem, "The.Matrix.1999");
        assert_eq!(file.extension, "mkv");
        assert_eq!(file.directory(), Path::new("/media/movies"));
        assert_eq!(
            file.cover_path(),
            PathBuf::from("/media/movies/The.Matrix.1999.jpg")
        );
    }

    #[test]
    fn rejects_paths_without_extension() {
        assert!(matches!(
            MediaFile::from_path("/media/movies/README"),
            Err(ModelError::MissingExtension(_))
        ));
    }

    #[test]
    fn extension_match_ignores_case() {
        let file = MediaFile::from_path("/m/Movie.MKV").unwrap();
        assert!(file.has_extension_in(&["mp4", "mkv"]));
        assert!(!file.has_extension_in(&["avi"]));
    }
}
