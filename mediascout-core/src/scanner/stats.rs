use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use mediascout_model::{DirectoryStats, DirectoryStatus, LocationType};
use tracing::{debug, warn};

use super::walk;

/// Filesystem types reported as network storage.
pub const NETWORK_FILESYSTEMS: &[&str] =
    &["nfs", "nfs4", "cifs", "smb", "smbfs", "fuse.sshfs", "ftp", "davfs"];

const MOUNTS_FILE: &str = "/proc/mounts";

/// Overview numbers for one configured directory.
///
/// Never fails: a directory that cannot be scanned yields a
/// [`DirectoryStatus::Error`] entry carrying the reason.
pub fn directory_stats(directory: &Path, extensions: &[String]) -> DirectoryStats {
    let location_type = detect_location(directory);

    let entries = match walk(directory, extensions) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot scan {}: {}", directory.display(), e);
            return DirectoryStats::failed(
                directory.to_path_buf(),
                location_type,
                e.to_string(),
            );
        }
    };

    let mut total_files = 0;
    let mut missing_covers = 0;
    let mut newest: Option<SystemTime> = None;
    for entry in entries {
        total_files += 1;
        if !entry.has_cover {
            missing_covers += 1;
        }
        if let Ok(modified) =
            fs::metadata(&entry.media_file.path).and_then(|m| m.modified())
        {
            newest = newest.max(Some(modified));
        }
    }

    DirectoryStats {
        directory: directory.to_path_buf(),
        total_files,
        missing_covers,
        last_modified: newest.map(DateTime::<Utc>::from),
        status: if missing_covers > 0 {
            DirectoryStatus::ActionNeeded
        } else {
            DirectoryStatus::Ok
        },
        location_type,
        is_writable: is_writable(directory),
        error: None,
    }
}

/// Check writability by creating (and immediately dropping) an anonymous file.
fn is_writable(directory: &Path) -> bool {
    tempfile::tempfile_in(directory).is_ok()
}

fn detect_location(directory: &Path) -> LocationType {
    let resolved = directory
        .canonicalize()
        .unwrap_or_else(|_| directory.to_path_buf());
    match fs::read_to_string(MOUNTS_FILE) {
        Ok(mounts) => location_from_mounts(&mounts, &resolved),
        Err(e) => {
            debug!("{MOUNTS_FILE} unavailable: {e}");
            LocationType::Unknown
        }
    }
}

/// Classify `directory` using a `/proc/mounts` style table.
///
/// The longest mount point containing the directory decides.
pub fn location_from_mounts(mounts: &str, directory: &Path) -> LocationType {
    mounts
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let _device = fields.next()?;
            let mount_point = PathBuf::from(unescape_mount_field(fields.next()?));
            let fs_type = fields.next()?;
            directory
                .starts_with(&mount_point)
                .then(|| (mount_point.components().count(), fs_type))
        })
        .max_by_key(|(depth, _)| *depth)
        .map(|(_, fs_type)| {
            if NETWORK_FILESYSTEMS.contains(&fs_type) {
                LocationType::Network
            } else {
                LocationType::Local
            }
        })
        .unwrap_or(LocationType::Unknown)
}

/// Undo the octal escaping the kernel applies to spaces, tabs and backslashes.
fn unescape_mount_field(field: &str) -> String {
    field
        .replace("\\040", " ")
        .replace("\\011", "\t")
        .replace("\\012", "\n")
        .replace("\\134", "\\")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    const MOUNTS: &str = "\
sysfs /sys sysfs rw,nosuid 0 0
/dev/sda1 / ext4 rw,relatime 0 0
nas:/export/movies /mnt/movies nfs4 rw,relatime 0 0
//nas/tv\\040shows /mnt/tv\\040shows cifs rw 0 0
/dev/sdb1 /mnt/movies/local ext4 rw 0 0
";

    #[test]
    fn longest_mount_point_wins() {
        assert_eq!(
            location_from_mounts(MOUNTS, Path::new("/mnt/movies/action")),
            LocationType::Network
        );
        assert_eq!(
            location_from_mounts(MOUNTS, Path::new("/mnt/movies/local/x")),
            LocationType::Local
        );
        assert_eq!(
            location_from_mounts(MOUNTS, Path::new("/home/me")),
            LocationType::Local
        );
    }

    #[test]
    fn escaped_mount_points_are_decoded() {
        assert_eq!(
            location_from_mounts(MOUNTS, Path::new("/mnt/tv shows/Lost")),
            LocationType::Network
        );
    }

    #[test]
    fn empty_table_is_unknown() {
        assert_eq!(
            location_from_mounts("", Path::new("/anything")),
            LocationType::Unknown
        );
    }

    #[test]
    fn stats_count_missing_covers() {
        let tmp = TempDir::new().unwrap();
        File::create(tmp.path().join("one.mkv")).unwrap();
        File::create(tmp.path().join("two.mkv")).unwrap();
        File::create(tmp.path().join("two.jpg")).unwrap();

        let stats = directory_stats(tmp.path(), &["mkv".to_string()]);
        assert_eq!(stats.total_files, 2);
        assert_eq!(stats.missing_covers, 1);
        assert_eq!(stats.status, DirectoryStatus::ActionNeeded);
        assert!(stats.last_modified.is_some());
        assert!(stats.is_writable);
        assert!(stats.error.is_none());
    }

    #[test]
    fn fully_covered_directory_is_ok() {
        let tmp = TempDir::new().unwrap();
        File::create(tmp.path().join("one.mkv")).unwrap();
        File::create(tmp.path().join("one.jpg")).unwrap();

        let stats = directory_stats(tmp.path(), &["mkv".to_string()]);
        assert_eq!(stats.status, DirectoryStatus::Ok);
    }

    #[test]
    fn missing_directory_reports_error() {
        let tmp = TempDir::new().unwrap();
        let stats = directory_stats(&tmp.path().join("gone"), &["mkv".to_string()]);
        assert_eq!(stats.status, DirectoryStatus::Error);
        assert!(stats.error.unwrap().contains("not found"));
    }
}
