//! Per-pack workspace paths
//!
//! ```text
//! <work_dir>/<name>/                      root_dir, holds v<version>.tar.gz
//! <work_dir>/<name>/<name>-<version>/     version_dir, the acquired source
//! <work_dir>/<name>/<name>-<version>/<name>/   build_dir for git packs
//! <work_dir>/out/                         output_dir, shared by every pack
//! ```

use crate::{
    config::Config,
    core::pack::{AcquisitionType, PackDefinition},
    error::{BuilderError, Result},
    utils::fs::{DirState, FileSystemUtils},
};
use std::path::PathBuf;
use tracing::info;

/// Directories used while acquiring and building one pack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceLayout {
    /// Container for every version of this pack
    pub root_dir: PathBuf,
    /// The acquired, version-specific source tree
    pub version_dir: PathBuf,
    /// Working directory handed to the build strategy
    pub build_dir: PathBuf,
    /// Shared output directory
    pub output_dir: PathBuf,
}

impl WorkspaceLayout {
    /// Derive the layout for `pack`; no file system access
    pub fn new(config: &Config, pack: &PackDefinition) -> Self {
        let root_dir = config.work_dir.join(&pack.name);
        let version_dir = root_dir.join(pack.qualified_name());
        let build_dir = match pack.acquisition {
            AcquisitionType::Git => version_dir.join(&pack.name),
            _ => version_dir.clone(),
        };

        Self {
            root_dir,
            version_dir,
            build_dir,
            output_dir: config.artifacts.output_dir.clone(),
        }
    }

    /// Path the release archive is downloaded to
    pub fn archive_path(&self, pack: &PackDefinition) -> PathBuf {
        self.root_dir.join(pack.archive_file_name())
    }

    /// Create `root_dir` unless it is already there
    pub async fn create_root(&self, fs_utils: &FileSystemUtils) -> Result<()> {
        if fs_utils
            .ensure_dir(&self.root_dir)
            .await
            .map_err(|e| BuilderError::layout(&self.root_dir, e))?
            == DirState::Created
        {
            info!("Created directory {}", self.root_dir.display());
        }
        Ok(())
    }

    /// Create `version_dir` unless it is already there
    pub async fn create_version_dir(&self, fs_utils: &FileSystemUtils) -> Result<()> {
        if fs_utils
            .ensure_dir(&self.version_dir)
            .await
            .map_err(|e| BuilderError::layout(&self.version_dir, e))?
            == DirState::Created
        {
            info!("Created directory {}", self.version_dir.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn config_in(work_dir: &Path) -> Config {
        let mut config = Config {
            work_dir: work_dir.to_path_buf(),
            ..Config::default()
        };
        config.artifacts.output_dir = work_dir.join("out");
        config
    }

    fn pack(acquisition: AcquisitionType) -> PackDefinition {
        PackDefinition {
            name: "ruby".to_string(),
            version: "1.2.3".to_string(),
            acquisition,
            ..PackDefinition::default()
        }
    }

    #[test]
    fn test_tar_layout() {
        let config = config_in(Path::new("/work"));
        let layout = WorkspaceLayout::new(&config, &pack(AcquisitionType::Tar));

        assert_eq!(layout.root_dir, PathBuf::from("/work/ruby"));
        assert_eq!(layout.version_dir, PathBuf::from("/work/ruby/ruby-1.2.3"));
        assert_eq!(layout.build_dir, layout.version_dir);
        assert_eq!(layout.output_dir, PathBuf::from("/work/out"));
        assert_eq!(
            layout.archive_path(&pack(AcquisitionType::Tar)),
            PathBuf::from("/work/ruby/v1.2.3.tar.gz")
        );
    }

    #[test]
    fn test_git_layout_builds_in_clone() {
        let config = config_in(Path::new("/work"));
        let layout = WorkspaceLayout::new(&config, &pack(AcquisitionType::Git));

        assert_eq!(layout.version_dir, PathBuf::from("/work/ruby/ruby-1.2.3"));
        assert_eq!(layout.build_dir, PathBuf::from("/work/ruby/ruby-1.2.3/ruby"));
    }

    #[tokio::test]
    async fn test_create_dirs_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(temp_dir.path());
        let layout = WorkspaceLayout::new(&config, &pack(AcquisitionType::Git));
        let fs_utils = FileSystemUtils::new();

        layout.create_root(&fs_utils).await.unwrap();
        layout.create_root(&fs_utils).await.unwrap();
        layout.create_version_dir(&fs_utils).await.unwrap();
        layout.create_version_dir(&fs_utils).await.unwrap();

        assert!(layout.root_dir.is_dir());
        assert!(layout.version_dir.is_dir());
        assert!(!layout.build_dir.exists());
    }

    #[tokio::test]
    async fn test_create_root_failure_is_layout_error() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(&temp_dir.path().join("missing"));
        let layout = WorkspaceLayout::new(&config, &pack(AcquisitionType::Tar));

        let err = layout.create_root(&FileSystemUtils::new()).await.unwrap_err();
        assert!(matches!(err, BuilderError::Layout { .. }));
    }
}
