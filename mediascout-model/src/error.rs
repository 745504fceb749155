use std::fmt::{self, Display};
use std::path::PathBuf;

/// Errors produced by model constructors and validation routines.
#[derive(Debug)]
pub enum ModelError {
    /// The path has no usable file stem (e.g. `/`, `..`, or non UTF-8).
    MissingStem(PathBuf),
    /// The path has no extension, so it cannot be a media file.
    MissingExtension(PathBuf),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::MissingStem(path) => {
                write!(f, "no file stem in {}", path.display())
            }
            ModelError::MissingExtension(path) => {
                write!(f, "no file extension in {}", path.display())
            }
        }
    }
}

impl std::error::Error for ModelError {}

/// Result alias for model constructors.
pub type Result<T> = std::result::Result<T, ModelError>;
