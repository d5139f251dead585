//! File system utility functions
//!
//! Async wrappers over `tokio::fs` with the idempotency rules the pipeline
//! relies on: creating an existing directory is not an error, and a zero-byte
//! file does not count as present.

use std::io;
use std::path::Path;
use tokio::fs;
use tracing::{debug, instrument};

/// Utility struct for file system operations
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSystemUtils;

/// What `ensure_dir` found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirState {
    /// The directory was created by this call
    Created,
    /// The directory was already there
    Existing,
}

impl FileSystemUtils {
    /// Create a new file system utilities instance
    pub fn new() -> Self {
        Self
    }

    /// Create a single directory unless it already exists
    ///
    /// The parent must exist. "Already exists" is success, so concurrent callers
    /// racing on the same path all succeed.
    #[instrument(skip(self))]
    pub async fn ensure_dir(&self, path: &Path) -> io::Result<DirState> {
        if fs::metadata(path).await.is_ok_and(|m| m.is_dir()) {
            return Ok(DirState::Existing);
        }

        match fs::create_dir(path).await {
            Ok(()) => {
                debug!("Created directory: {}", path.display());
                Ok(DirState::Created)
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(DirState::Existing),
            Err(e) => Err(e),
        }
    }

    /// Whether `path` is a regular file with at least one byte in it
    pub async fn is_non_empty_file(&self, path: &Path) -> bool {
        fs::metadata(path)
            .await
            .is_ok_and(|m| m.is_file() && m.len() > 0)
    }

    /// Whether `path` exists and is a directory
    pub async fn is_dir(&self, path: &Path) -> bool {
        fs::metadata(path).await.is_ok_and(|m| m.is_dir())
    }

    /// Whether anything exists at `path`
    pub async fn exists(&self, path: &Path) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }

    /// Rename a file; the destination must be on the same file system
    #[instrument(skip(self))]
    pub async fn move_file(&self, src: &Path, dst: &Path) -> io::Result<()> {
        debug!("Moving file: {} -> {}", src.display(), dst.display());
        fs::rename(src, dst).await
    }

    /// Remove a directory and all its contents if it exists
    #[instrument(skip(self))]
    pub async fn remove_dir_all_if_exists(&self, path: &Path) -> io::Result<bool> {
        match fs::remove_dir_all(path).await {
            Ok(()) => {
                debug!("Removed directory: {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Write content to a file
    #[instrument(skip(self, contents))]
    pub async fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        debug!("Writing file: {}", path.display());
        fs::write(path, contents).await
    }
}
