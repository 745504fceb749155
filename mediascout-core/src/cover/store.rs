use std::io::Write;
use std::path::Path;

use tempfile::Builder;

use crate::error::{Result, ScoutError};

/// Write `bytes` to `target` through a temp file in the same directory.
///
/// Readers see either the previous file or the complete new one. The temp file
/// is removed on every failure path.
pub fn write_atomic(target: &Path, bytes: &[u8]) -> Result<()> {
    let write_err = |source| ScoutError::Write {
        path: target.to_path_buf(),
        source,
    };
    let directory = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = Builder::new()
        .prefix(".mediascout-")
        .suffix(".tmp")
        .tempfile_in(directory)
        .map_err(write_err)?;

    tmp.write_all(bytes).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(target).map_err(|e| write_err(e.error))?;
    Ok(())
}
