//! Configuration management for the buildpack builder
//!
//! `PackDocument` is the YAML document the user points the tool at. `Config`
//! holds the runtime settings derived from it and from the command line, and is
//! threaded by value into every pack task.

use crate::{cli::Args, core::pack::PackDefinition, error::BuilderError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, instrument};

/// Names and versions become directory names, so they must be a single safe component
static PATH_COMPONENT: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._+-]*$"));

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Enable debug logging and stream build tool output
    pub debug: bool,
    /// Directory the pack workspaces are created under
    pub work_dir: PathBuf,
    /// Maximum number of packs processed at once, `None` for unbounded
    pub jobs: Option<usize>,
    /// Release-host conventions for official packs
    pub sources: SourceConfig,
    /// External tool names
    pub tools: ToolConfig,
    /// Artifact configuration
    pub artifacts: ArtifactConfig,
}

/// URL templates for official packs; `{name}` and `{version}` are substituted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Release tarball location
    pub archive_url: String,
    /// Clone URL
    pub repository_url: String,
}

/// Program names of the external collaborators
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Archive extraction
    pub tar: String,
    /// Source control client
    pub git: String,
    /// Packaging CLI
    pub packager: String,
    /// Ruby dependency manager
    pub bundler: String,
}

/// Artifact configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    /// Shared output directory for all packs
    pub output_dir: PathBuf,
    /// File name patterns recognized as artifacts
    pub patterns: Vec<String>,
    /// Place each pack's artifacts under `<output_dir>/<name>/`
    pub namespace_by_pack: bool,
}

/// The configuration document: a list of packs plus document-level settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackDocument {
    /// Packs to process
    #[serde(default)]
    pub buildpacks: Vec<PackDefinition>,
    /// Document-level debug flag
    #[serde(default)]
    pub debug: bool,
    /// Optional concurrency cap
    #[serde(default)]
    pub jobs: Option<usize>,
    /// Optional overrides of the release-host conventions
    #[serde(default)]
    pub sources: Option<SourceConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            work_dir: PathBuf::from("."),
            jobs: None,
            sources: SourceConfig::default(),
            tools: ToolConfig::default(),
            artifacts: ArtifactConfig::default(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            archive_url: "https://github.com/cloudfoundry/{name}/archive/refs/tags/v{version}.tar.gz"
                .to_string(),
            repository_url: "https://github.com/cloudfoundry/{name}.git".to_string(),
        }
    }
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            tar: "tar".to_string(),
            git: "git".to_string(),
            packager: "buildpack-packager".to_string(),
            bundler: "bundle".to_string(),
        }
    }
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("out"),
            patterns: vec!["*.zip".to_string()],
            namespace_by_pack: false,
        }
    }
}

impl SourceConfig {
    /// Release tarball URL for an official pack
    pub fn archive_url_for(&self, pack: &PackDefinition) -> String {
        expand_template(&self.archive_url, pack)
    }

    /// Clone URL for an official pack
    pub fn repository_url_for(&self, pack: &PackDefinition) -> String {
        expand_template(&self.repository_url, pack)
    }
}

fn expand_template(template: &str, pack: &PackDefinition) -> String {
    template
        .replace("{name}", &pack.name)
        .replace("{version}", &pack.version)
}

impl Config {
    /// Create configuration from command line arguments and the loaded document
    pub fn from_args(args: &Args, document: &PackDocument) -> Result<Self, BuilderError> {
        // Tools run inside pack directories, so every derived path must be absolute
        let work_dir = match &args.work_dir {
            Some(dir) => std::path::absolute(dir),
            None => std::env::current_dir(),
        }
        .map_err(|e| BuilderError::config_with_source("could not resolve the working directory", e))?;

        let config = Self {
            debug: args.debug || document.debug,
            jobs: args.jobs.or(document.jobs),
            sources: document.sources.clone().unwrap_or_default(),
            artifacts: ArtifactConfig {
                output_dir: work_dir.join("out"),
                namespace_by_pack: args.namespace_artifacts,
                ..ArtifactConfig::default()
            },
            work_dir,
            ..Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), BuilderError> {
        if !self.work_dir.is_dir() {
            return Err(BuilderError::validation(format!(
                "Working directory not found: {}",
                self.work_dir.display()
            )));
        }

        if self.jobs == Some(0) {
            return Err(BuilderError::validation("jobs must be at least 1"));
        }

        if self.artifacts.patterns.is_empty() {
            return Err(BuilderError::validation(
                "at least one artifact pattern is required",
            ));
        }

        Ok(())
    }
}

impl PackDocument {
    /// Load the document from a YAML file
    #[instrument]
    pub fn load(path: &Path) -> Result<Self, BuilderError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| BuilderError::file_system("read", path, e))?;
        let document = Self::from_yaml(&content)?;
        debug!(
            "Loaded {} pack definition(s) from {}",
            document.buildpacks.len(),
            path.display()
        );
        Ok(document)
    }

    /// Parse the document from YAML text
    pub fn from_yaml(content: &str) -> Result<Self, BuilderError> {
        serde_yaml::from_str(content)
            .map_err(|e| BuilderError::config_with_source("invalid pack document", e))
    }
}

/// Check that a pack's identity can safely become a directory name
pub fn validate_pack(pack: &PackDefinition) -> Result<(), BuilderError> {
    let component = PATH_COMPONENT
        .as_ref()
        .map_err(|e| BuilderError::config(format!("Failed to compile regex: {e}")))?;

    for (field, value) in [("name", &pack.name), ("version", &pack.version)] {
        if !component.is_match(value) {
            return Err(BuilderError::config(format!(
                "pack {field} {value:?} is not a valid directory name"
            )));
        }
    }
    Ok(())
}
