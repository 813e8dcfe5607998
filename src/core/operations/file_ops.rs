use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error};

use crate::config::CopyPolicy;

/// Result type for file operations
pub type FileOpResult<T> = Result<T, FileOpError>;

/// Error types for single-file operations
#[derive(Debug, Error)]
pub enum FileOpError {
    #[error("failed to create directory {path:?}: {source}")]
    CreateDirFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to copy {src:?} to {dest:?}: {source}")]
    CopyFailed {
        src: PathBuf,
        dest: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to remove original file {path:?}: {source}")]
    RemoveFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Create `dir` and any missing parents. Existing directories are fine.
pub fn ensure_dir(dir: &Path) -> FileOpResult<()> {
    fs::create_dir_all(dir).map_err(|source| FileOpError::CreateDirFailed {
        path: dir.to_path_buf(),
        source,
    })
}

/// Copy a file, creating the destination's parent directory on demand
pub fn copy_file(src: &Path, dest: &Path) -> FileOpResult<()> {
    if let Some(parent) = dest.parent() {
        ensure_dir(parent)?;
    }
    fs::copy(src, dest).map_err(|source| {
        error!("Failed to copy file from {:?} to {:?}: {}", src, dest, source);
        FileOpError::CopyFailed {
            src: src.to_path_buf(),
            dest: dest.to_path_buf(),
            source,
        }
    })?;
    Ok(())
}

/// Move a file, creating the destination's parent directory on demand.
///
/// Tries a rename first and falls back to copy + remove, which also works
/// across drives.
pub fn move_file(src: &Path, dest: &Path) -> FileOpResult<()> {
    if let Some(parent) = dest.parent() {
        ensure_dir(parent)?;
    }

    if fs::rename(src, dest).is_ok() {
        return Ok(());
    }
    debug!("Rename of {:?} failed, falling back to copy + remove", src);

    copy_file(src, dest)?;

    if let Err(source) = fs::remove_file(src) {
        error!("Failed to remove original file {:?} after copy: {}", src, source);
        // Keep exactly one copy around
        let _ = fs::remove_file(dest);
        return Err(FileOpError::RemoveFailed {
            path: src.to_path_buf(),
            source,
        });
    }

    Ok(())
}

/// Copy or move according to `policy`
pub fn transfer_file(src: &Path, dest: &Path, policy: CopyPolicy) -> FileOpResult<()> {
    match policy {
        CopyPolicy::Copy => copy_file(src, dest),
        CopyPolicy::Move => move_file(src, dest),
    }
}
