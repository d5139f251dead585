//! Resource acquisition
//!
//! Materializes a pack's source tree under its version directory, either by
//! downloading and extracting a release archive or by cloning the repository.
//! Both paths are idempotent across runs.

use crate::{
    config::Config,
    core::{
        layout::WorkspaceLayout,
        pack::{AcquisitionType, PackDefinition},
    },
    error::{BuilderError, Result},
    utils::{
        fs::FileSystemUtils,
        http::Downloader,
        process::{CommandSpec, ProcessRunner},
    },
};
use std::path::Path;
use tracing::{info, instrument, warn};

/// Written into the version directory once a clone and its submodules are complete
pub const CLONE_COMPLETE_MARKER: &str = ".packbuilder-complete";

/// What acquisition actually did
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AcquireOutcome {
    /// An archive was fetched over the network
    pub downloaded: bool,
    /// The archive was unpacked
    pub extracted: bool,
    /// The repository was cloned
    pub cloned: bool,
}

/// Fetches pack sources into the workspace
pub struct ResourceAcquirer<'a> {
    config: &'a Config,
    downloader: &'a Downloader,
    process_runner: ProcessRunner,
    fs_utils: FileSystemUtils,
}

impl<'a> ResourceAcquirer<'a> {
    /// Create an acquirer sharing the run's HTTP client
    pub fn new(config: &'a Config, downloader: &'a Downloader) -> Self {
        Self {
            config,
            downloader,
            process_runner: ProcessRunner::new(config.debug),
            fs_utils: FileSystemUtils::new(),
        }
    }

    /// Acquire the pack's source according to its acquisition type
    #[instrument(skip_all)]
    pub async fn acquire(
        &self,
        pack: &PackDefinition,
        layout: &WorkspaceLayout,
    ) -> Result<AcquireOutcome> {
        match &pack.acquisition {
            AcquisitionType::Tar => {
                let url = self.archive_url(pack)?;
                let archive = layout.archive_path(pack);
                let downloaded = self.fetch_archive(pack, &url, &archive).await?;
                let extracted = self.extract_archive(pack, layout).await?;
                Ok(AcquireOutcome {
                    downloaded,
                    extracted,
                    cloned: false,
                })
            }
            AcquisitionType::Git => {
                let url = self.repository_url(pack)?;
                let cloned = self.clone_repository(pack, layout, &url).await?;
                Ok(AcquireOutcome {
                    cloned,
                    ..AcquireOutcome::default()
                })
            }
            AcquisitionType::Unknown(raw) => Err(BuilderError::config(format!(
                "invalid download type {raw:?}, expected \"tar\" or \"git\""
            ))),
        }
    }

    /// Release archive URL: the host convention for official packs, `tar.url` otherwise
    pub fn archive_url(&self, pack: &PackDefinition) -> Result<String> {
        if pack.official {
            return Ok(self.config.sources.archive_url_for(pack));
        }
        match pack.tar_location.url.trim() {
            "" => Err(BuilderError::config("tar URL was not specified")),
            url => Ok(url.to_string()),
        }
    }

    /// Clone URL: the host convention for official packs, `git.repo` otherwise
    pub fn repository_url(&self, pack: &PackDefinition) -> Result<String> {
        if pack.official {
            return Ok(self.config.sources.repository_url_for(pack));
        }
        match pack.git_location.repo.trim() {
            "" => Err(BuilderError::config("git repository URL was not specified")),
            url => Ok(url.to_string()),
        }
    }

    /// Download the archive unless a non-empty copy is already on disk
    async fn fetch_archive(&self, pack: &PackDefinition, url: &str, archive: &Path) -> Result<bool> {
        let file_name = pack.archive_file_name();

        if self.fs_utils.is_non_empty_file(archive).await {
            info!("File: {} already exists! Skipping Download", file_name);
            return Ok(false);
        }

        info!("File: {} Starting Download from {}", file_name, url);
        let size = self.downloader.download_to(url, archive).await?;
        info!("File: {} Downloaded Size {}", file_name, size);

        Ok(true)
    }

    /// Unpack the archive into `root_dir` unless `version_dir` already exists
    ///
    /// tar runs inside `root_dir`, so its arguments are relative to it.
    async fn extract_archive(&self, pack: &PackDefinition, layout: &WorkspaceLayout) -> Result<bool> {
        if self.fs_utils.is_dir(&layout.version_dir).await {
            return Ok(false);
        }

        info!("Started Extraction of source {}", layout.version_dir.display());
        let spec = CommandSpec::new(&self.config.tools.tar, &layout.root_dir)
            .arg("-zxf")
            .arg(pack.archive_file_name())
            .args(["-C", "."]);
        self.process_runner.run(&spec).await?;

        if self.fs_utils.is_dir(&layout.version_dir).await {
            info!("Completed Extraction");
        } else {
            warn!(
                "Archive did not contain {}; nothing will be built",
                layout.version_dir.display()
            );
        }
        Ok(true)
    }

    /// Shallow-clone the release tag and its submodules into `version_dir`
    ///
    /// A version directory without the completion marker is a leftover from an
    /// interrupted run and is removed before cloning again.
    async fn clone_repository(
        &self,
        pack: &PackDefinition,
        layout: &WorkspaceLayout,
        url: &str,
    ) -> Result<bool> {
        let marker = layout.version_dir.join(CLONE_COMPLETE_MARKER);

        if self.fs_utils.is_dir(&layout.version_dir).await {
            if self.fs_utils.exists(&marker).await {
                info!("Repository {} already cloned", layout.version_dir.display());
                return Ok(false);
            }
            warn!(
                "Removing incomplete clone at {}",
                layout.version_dir.display()
            );
            self.fs_utils
                .remove_dir_all_if_exists(&layout.version_dir)
                .await
                .map_err(|e| BuilderError::file_system("remove", &layout.version_dir, e))?;
        }

        layout.create_version_dir(&self.fs_utils).await?;

        info!("Cloning Repo {} at {}", url, pack.tag());
        let clone = CommandSpec::new(&self.config.tools.git, &layout.version_dir)
            .args(["clone", "--depth=1", "--single-branch", "--branch"])
            .arg(pack.tag())
            .arg(url)
            .arg(&pack.name);
        self.process_runner.run(&clone).await?;

        info!("Getting submodules");
        let submodules = CommandSpec::new(&self.config.tools.git, &layout.build_dir)
            .args(["submodule", "update", "--init", "--recursive"]);
        self.process_runner.run(&submodules).await?;

        self.fs_utils
            .write_file(&marker, pack.tag().as_bytes())
            .await
            .map_err(|e| BuilderError::file_system("write", &marker, e))?;

        info!("Clone of {} successful", pack.tag());
        Ok(true)
    }
}
