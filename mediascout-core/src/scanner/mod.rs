//! Directory scanning.
//!
//! Nothing here is cached: whether a file "has a cover" is decided by looking
//! for `{stem}.jpg` on disk every time a walk reaches it.

mod stats;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use mediascout_model::{MediaFile, ScanReport, ScannedFile};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::{Result, ScoutError};
use crate::parser::TitleParser;

pub use stats::{NETWORK_FILESYSTEMS, directory_stats, location_from_mounts};

/// Lowercase and strip a leading dot, dropping empty entries.
pub fn normalize_extensions<S: AsRef<str>>(extensions: &[S]) -> Vec<String> {
    let mut normalized: Vec<String> = extensions
        .iter()
        .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect();
    normalized.sort();
    normalized.dedup();
    normalized
}

/// Verify that `directory` exists, is a directory and can be listed.
pub fn check_directory(directory: &Path) -> Result<()> {
    let metadata = fs::metadata(directory)
        .map_err(|e| ScoutError::from_io(directory, e))?;
    if !metadata.is_dir() {
        return Err(ScoutError::NotADirectory(directory.to_path_buf()));
    }
    fs::read_dir(directory).map_err(|e| ScoutError::from_io(directory, e))?;
    Ok(())
}

/// An eligible media file and whether its cover already exists.
#[derive(Debug, Clone)]
pub struct ScanEntry {
    /// The media file.
    pub media_file: MediaFile,
    /// Whether `{stem}.jpg` exists next to it.
    pub has_cover: bool,
}

/// Every eligible media file under `directory`, covered or not.
///
/// The walk is lazy, recursive and sorted by file name within each directory.
pub fn walk(
    directory: &Path,
    extensions: &[String],
) -> Result<impl Iterator<Item = ScanEntry> + use<>> {
    check_directory(directory)?;
    let extensions = normalize_extensions(extensions);
    let root = directory.to_path_buf();

    let entries = WalkDir::new(&root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(move |entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                None
            }
        })
        .filter_map(move |entry| eligible(&entry, &extensions))
        .map(|media_file| {
            let has_cover = media_file.cover_path().is_file();
            ScanEntry {
                media_file,
                has_cover,
            }
        });

    Ok(entries)
}

fn eligible(entry: &DirEntry, extensions: &[String]) -> Option<MediaFile> {
    if !entry.file_type().is_file() {
        return None;
    }
    let media_file = match MediaFile::from_path(entry.path()) {
        Ok(media_file) => media_file,
        Err(e) => {
            debug!("Ignoring {}: {}", entry.path().display(), e);
            return None;
        }
    };
    media_file.has_extension_in(extensions).then_some(media_file)
}

/// Media files under `directory` that have no `{stem}.jpg` next to them.
pub fn scan(
    directory: &Path,
    extensions: &[String],
) -> Result<impl Iterator<Item = MediaFile> + use<>> {
    Ok(walk(directory, extensions)?
        .filter(|entry| !entry.has_cover)
        .map(|entry| entry.media_file))
}

/// Scan `directory` and parse every needs-cover file.
pub fn scan_report(
    directory: &Path,
    extensions: &[String],
    parser: &TitleParser,
) -> Result<ScanReport> {
    info!("Scanning {}", directory.display());

    let mut total_files = 0;
    let mut files = Vec::new();
    for entry in walk(directory, extensions)? {
        total_files += 1;
        if entry.has_cover {
            continue;
        }
        let parsed = parser.parse(&entry.media_file.stem);
        files.push(ScannedFile {
            media_file: entry.media_file,
            parsed,
        });
    }

    info!(
        "Scan of {} complete: {} media files, {} missing covers",
        directory.display(),
        total_files,
        files.len()
    );

    Ok(ScanReport {
        directory: directory.to_path_buf(),
        total_files,
        missing_covers: files.len(),
        files,
        scanned_at: Utc::now(),
    })
}

/// Whether `path` resolves to a location below one of `roots`.
pub fn is_within_roots(path: &Path, roots: &[PathBuf]) -> bool {
    let Ok(path) = path.canonicalize() else {
        return false;
    };
    roots.iter().any(|root| {
        root.canonicalize()
            .map(|root| path.starts_with(root))
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        File::create(&path).unwrap();
        path
    }

    fn exts(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn names(files: impl Iterator<Item = MediaFile>) -> Vec<String> {
        files.map(|f| f.file_name()).collect()
    }

    #[test]
    fn lists_files_without_covers() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "movie.mkv");
        touch(tmp.path(), "covered.mp4");
        touch(tmp.path(), "covered.jpg");
        touch(tmp.path(), "notes.txt");

        let found = scan(tmp.path(), &exts(&["mkv", "mp4"])).unwrap();
        assert_eq!(names(found), vec!["movie.mkv"]);
    }

    #[test]
    fn extension_match_ignores_case_and_dots() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "Loud.MKV");
        touch(tmp.path(), "quiet.avi");

        let found = scan(tmp.path(), &exts(&[".mkv", "AVI"])).unwrap();
        assert_eq!(names(found), vec!["Loud.MKV", "quiet.avi"]);
    }

    #[test]
    fn walks_subdirectories() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "a/b/deep.mkv");
        touch(tmp.path(), "top.mkv");
        touch(tmp.path(), "a/b/deep.jpg");

        let found: Vec<_> = scan(tmp.path(), &exts(&["mkv"])).unwrap().collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, tmp.path().join("top.mkv"));
    }

    #[test]
    fn cover_must_sit_in_the_same_directory() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "sub/movie.mkv");
        touch(tmp.path(), "movie.jpg");

        let found = scan(tmp.path(), &exts(&["mkv"])).unwrap();
        assert_eq!(names(found), vec!["movie.mkv"]);
    }

    #[test]
    fn missing_directory_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");
        assert!(matches!(
            scan(&missing, &exts(&["mkv"])),
            Err(ScoutError::NotFound(_))
        ));
    }

    #[test]
    fn file_is_not_a_directory() {
        let tmp = TempDir::new().unwrap();
        let file = touch(tmp.path(), "movie.mkv");
        assert!(matches!(
            check_directory(&file),
            Err(ScoutError::NotADirectory(_))
        ));
    }

    #[test]
    fn report_counts_and_parses() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "The.Matrix.1999.1080p.BluRay.mkv");
        touch(tmp.path(), "Heat.mkv");
        touch(tmp.path(), "Heat.jpg");

        let report =
            scan_report(tmp.path(), &exts(&["mkv"]), &TitleParser::default())
                .unwrap();
        assert_eq!(report.total_files, 2);
        assert_eq!(report.missing_covers, 1);
        assert_eq!(report.files[0].parsed.title, "The Matrix");
        assert_eq!(report.files[0].parsed.year, Some(1999));
    }

    #[test]
    fn normalizes_extension_lists() {
        assert_eq!(
            normalize_extensions(&[".MKV", "mkv", " mp4 ", ""]),
            vec!["mkv".to_string(), "mp4".to_string()]
        );
    }

    #[test]
    fn roots_contain_nested_paths_only() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("movies");
        let inside = touch(&root, "x/film.mkv");
        let outside = touch(tmp.path(), "other/film.mkv");

        assert!(is_within_roots(&inside, std::slice::from_ref(&root)));
        assert!(!is_within_roots(&outside, &[root.clone()]));
        assert!(!is_within_roots(&root.join("../other/film.mkv"), &[root]));
    }
}
