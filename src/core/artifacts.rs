//! Artifact collection functionality
//!
//! After a successful build, packaged buildpacks are moved out of the build
//! directory into the shared output directory.

use crate::{
    config::Config,
    core::{layout::WorkspaceLayout, pack::PackDefinition},
    error::{BuilderError, Result},
    utils::fs::FileSystemUtils,
};
use glob::Pattern;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Moves recognized build outputs into the shared output directory
pub struct ArtifactCollector<'a> {
    config: &'a Config,
    fs_utils: FileSystemUtils,
}

/// Information about a collected artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedArtifact {
    /// Where the build left it
    pub source: PathBuf,
    /// Where it lives now
    pub destination: PathBuf,
}

impl<'a> ArtifactCollector<'a> {
    /// Create a new artifact collector
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            fs_utils: FileSystemUtils::new(),
        }
    }

    /// Move every recognized artifact out of the pack's build directory
    ///
    /// A move failure aborts the remaining moves for this pack.
    #[instrument(skip_all)]
    pub async fn collect(
        &self,
        pack: &PackDefinition,
        layout: &WorkspaceLayout,
    ) -> Result<Vec<CollectedArtifact>> {
        let found = self.find_artifacts(&layout.build_dir).await?;
        if found.is_empty() {
            info!("No artifacts found in {}", layout.build_dir.display());
            return Ok(Vec::new());
        }

        let destination_dir = self.destination_dir(pack, layout).await?;

        let mut collected = Vec::with_capacity(found.len());
        for source in found {
            collected.push(self.collect_file(&source, &destination_dir).await?);
        }

        info!("Successfully collected {} artifacts", collected.len());
        Ok(collected)
    }

    /// Non-directory entries of `dir` whose file name matches an artifact pattern
    async fn find_artifacts(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let patterns = self.patterns()?;
        let list_error =
            |e| BuilderError::artifact("Failed to list build output", dir, Some(e));

        let mut entries = tokio::fs::read_dir(dir).await.map_err(list_error)?;
        let mut found = Vec::new();

        while let Some(entry) = entries.next_entry().await.map_err(list_error)? {
            let file_type = entry.file_type().await.map_err(list_error)?;
            if file_type.is_dir() {
                continue;
            }

            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                warn!("Ignoring non UTF-8 file name {:?}", name);
                continue;
            };

            if patterns.iter().any(|p| p.matches(name)) {
                debug!("Found artifact: {}", name);
                found.push(entry.path());
            }
        }

        // Sort for consistent output
        found.sort();
        Ok(found)
    }

    fn patterns(&self) -> Result<Vec<Pattern>> {
        self.config
            .artifacts
            .patterns
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|e| {
                    BuilderError::config_with_source(format!("invalid artifact pattern {p:?}"), e)
                })
            })
            .collect()
    }

    /// The shared output directory, or `<output>/<name>` when namespacing is on
    async fn destination_dir(
        &self,
        pack: &PackDefinition,
        layout: &WorkspaceLayout,
    ) -> Result<PathBuf> {
        if !self.config.artifacts.namespace_by_pack {
            return Ok(layout.output_dir.clone());
        }

        let dir = layout.output_dir.join(&pack.name);
        self.fs_utils
            .ensure_dir(&dir)
            .await
            .map_err(|e| BuilderError::layout(&dir, e))?;
        Ok(dir)
    }

    /// Move a single file
    async fn collect_file(&self, source: &Path, destination_dir: &Path) -> Result<CollectedArtifact> {
        let file_name = source
            .file_name()
            .ok_or_else(|| BuilderError::artifact("Invalid file name", source, None))?;
        let destination = destination_dir.join(file_name);

        if self.fs_utils.exists(&destination).await {
            warn!("Overwriting existing artifact {}", destination.display());
        }

        self.fs_utils
            .move_file(source, &destination)
            .await
            .map_err(|e| {
                BuilderError::artifact(
                    format!("Failed to move {}", source.display()),
                    source,
                    Some(e),
                )
            })?;
        info!("  Moved: {} -> {}", source.display(), destination.display());

        Ok(CollectedArtifact {
            source: source.to_path_buf(),
            destination,
        })
    }
}
