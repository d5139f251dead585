//! Build strategy dispatch
//!
//! Each pack declares one of four build recipes. `PackBuilder::plan` turns the
//! declaration into concrete commands; `PackBuilder::build` runs them in the
//! pack's build directory once the precondition directory exists.

use crate::{
    config::Config,
    core::{
        layout::WorkspaceLayout,
        pack::{BuildType, PackDefinition},
    },
    error::{BuilderError, Result},
    utils::{
        fs::FileSystemUtils,
        process::{CommandSpec, ProcessRunner},
    },
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Gemfile the Ruby-based packagers install from
pub const PACKAGER_GEMFILE: &str = "cf.Gemfile";

/// Commands a strategy will run, and the directory that must exist first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlan {
    pub strategy: BuildType,
    /// Missing means there is nothing to build yet
    pub precondition: PathBuf,
    pub steps: Vec<CommandSpec>,
}

/// Whether anything was built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStatus {
    Built,
    /// The precondition directory was missing; nothing ran
    NothingToBuild,
}

/// Runs the build strategy selected by a pack definition
pub struct PackBuilder<'a> {
    config: &'a Config,
    process_runner: ProcessRunner,
    fs_utils: FileSystemUtils,
}

impl<'a> PackBuilder<'a> {
    /// Create a new pack builder with the given configuration
    #[must_use]
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            process_runner: ProcessRunner::new(config.debug),
            fs_utils: FileSystemUtils::new(),
        }
    }

    /// Resolve the pack's build type into commands
    pub fn plan(&self, pack: &PackDefinition, layout: &WorkspaceLayout) -> Result<BuildPlan> {
        let strategy = pack.build.build_type;
        let cwd = &layout.build_dir;
        let tools = &self.config.tools;

        let (precondition, steps) = match strategy {
            BuildType::Packager => (
                layout.build_dir.clone(),
                vec![
                    CommandSpec::new(&tools.packager, cwd)
                        .args(["build", "-stack", pack.stack.as_str()])
                        .args(["--cached", pack.offline_flag()]),
                ],
            ),
            BuildType::OldPackager => {
                let cached = if pack.offline { "--uncached" } else { "--cached" };
                (
                    layout.version_dir.clone(),
                    vec![
                        self.bundle_install(cwd),
                        CommandSpec::new(&tools.bundler, cwd)
                            .args(["exec", tools.packager.as_str(), cached])
                            .arg(format!("--stack={}", pack.stack))
                            .env("BUNDLE_GEMFILE", PACKAGER_GEMFILE),
                    ],
                )
            }
            BuildType::Custom => {
                let exec = &pack.build.exec;
                if exec.cmd.trim().is_empty() {
                    return Err(BuilderError::config(
                        "custom build requires build.exec.cmd",
                    ));
                }
                (
                    layout.version_dir.clone(),
                    vec![
                        CommandSpec::new(&exec.cmd, cwd)
                            .args(exec.args.iter().cloned())
                            .streamed(),
                    ],
                )
            }
            BuildType::Java => (
                layout.version_dir.clone(),
                vec![
                    self.bundle_install(cwd),
                    CommandSpec::new(&tools.bundler, cwd)
                        .args(["exec", "rake", "clean", "package"])
                        .arg(format!("OFFLINE={}", pack.offline_flag())),
                ],
            ),
        };

        Ok(BuildPlan {
            strategy,
            precondition,
            steps,
        })
    }

    fn bundle_install(&self, cwd: &Path) -> CommandSpec {
        CommandSpec::new(&self.config.tools.bundler, cwd)
            .arg("install")
            .env("BUNDLE_GEMFILE", PACKAGER_GEMFILE)
    }

    /// Build the pack, or do nothing if its sources are not in place
    #[instrument(skip_all, fields(strategy = %pack.build.build_type))]
    pub async fn build(
        &self,
        pack: &PackDefinition,
        layout: &WorkspaceLayout,
    ) -> Result<BuildStatus> {
        let plan = self.plan(pack, layout)?;

        if !self.fs_utils.is_dir(&plan.precondition).await {
            info!(
                "{} does not exist, nothing to build",
                plan.precondition.display()
            );
            return Ok(BuildStatus::NothingToBuild);
        }

        info!("Started building buildpack using {}...", plan.strategy);
        for step in &plan.steps {
            let result = self.process_runner.run(step).await?;
            if let Some(line) = last_line(&result.stdout) {
                debug!("{}: {}", step.program, line);
            }
            if let Some(line) = last_line(&result.stderr) {
                warn!("{} (stderr): {}", step.program, line);
            }
        }
        info!("Completed building buildpack!");

        Ok(BuildStatus::Built)
    }
}

fn last_line(output: &str) -> Option<&str> {
    output.lines().map(str::trim).rev().find(|l| !l.is_empty())
}
