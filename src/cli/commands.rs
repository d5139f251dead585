//! Command implementations for the CLI

use crate::{
    cli::Args,
    config::{Config, PackDocument},
    core::orchestrator::{Orchestrator, PackOutcome, RunSummary},
};
use anyhow::{Context, bail};
use std::path::Path;
use tracing::{info, instrument, warn};

/// Run every pack in the document and report the outcome
#[instrument(skip_all, fields(config = %args.config.display()))]
pub async fn execute_command(args: &Args, document: PackDocument) -> anyhow::Result<()> {
    let config = Config::from_args(args, &document).context("Invalid configuration")?;

    info!(
        "Processing {} buildpacks in {}",
        document.buildpacks.len(),
        config.work_dir.display()
    );

    let orchestrator = Orchestrator::new(config).context("Failed to initialize")?;
    let summary = orchestrator
        .run(document.buildpacks)
        .await
        .context("Failed to prepare the output directory")?;

    log_summary(&summary);

    if let Some(path) = &args.report {
        write_report(&summary, path)?;
    }

    let failed = summary.failed().count();
    if args.strict && failed > 0 {
        bail!("{failed} buildpack(s) failed");
    }

    Ok(())
}

fn log_summary(summary: &RunSummary) {
    for report in &summary.packs {
        match &report.outcome {
            PackOutcome::Built { artifacts } => info!(
                "{} {}: built, {} artifact(s)",
                report.name,
                report.version,
                artifacts.len()
            ),
            PackOutcome::NothingToBuild => {
                info!("{} {}: nothing to build", report.name, report.version)
            }
            PackOutcome::Skipped => info!("{} {}: skipped", report.name, report.version),
            PackOutcome::Failed { error } => {
                warn!("{} {}: failed: {}", report.name, report.version, error)
            }
        }
    }
}

/// Serialize the summary as YAML
fn write_report(summary: &RunSummary, path: &Path) -> anyhow::Result<()> {
    let yaml = serde_yaml::to_string(summary).context("Failed to serialize run summary")?;
    std::fs::write(path, yaml)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    info!("Report written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::orchestrator::PackReport;
    use chrono::Utc;
    use clap::Parser;
    use tempfile::TempDir;

    fn skipped_document() -> PackDocument {
        PackDocument::from_yaml(
            "buildpacks:\n  - name: ruby\n    version: 1.2.3\n    stack: cflinuxfs4\n    official: true\n    type: tar\n    skip: true\n",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_all_skipped_run_writes_report() {
        let temp_dir = TempDir::new().unwrap();
        let report = temp_dir.path().join("report.yml");
        let args = Args::try_parse_from([
            "packbuilder",
            "--work-dir",
            temp_dir.path().to_str().unwrap(),
            "--report",
            report.to_str().unwrap(),
            "packs.yml",
        ])
        .unwrap();

        execute_command(&args, skipped_document()).await.unwrap();

        let written = std::fs::read_to_string(&report).unwrap();
        assert!(written.contains("name: ruby"));
        assert!(written.contains("status: skipped"));
        assert!(!temp_dir.path().join("out").exists());
    }

    #[tokio::test]
    async fn test_invalid_work_dir_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing");
        let args = Args::try_parse_from([
            "packbuilder",
            "--work-dir",
            missing.to_str().unwrap(),
            "packs.yml",
        ])
        .unwrap();

        assert!(execute_command(&args, skipped_document()).await.is_err());
    }

    #[tokio::test]
    async fn test_strict_mode_fails_on_pack_failure() {
        let temp_dir = TempDir::new().unwrap();
        let document = PackDocument::from_yaml(
            "buildpacks:\n  - name: staticfile\n    version: 1.6.0\n    type: tar\n",
        )
        .unwrap();
        let work_dir = temp_dir.path().to_str().unwrap();

        let lenient = Args::try_parse_from(["packbuilder", "--work-dir", work_dir, "packs.yml"]).unwrap();
        assert!(execute_command(&lenient, document.clone()).await.is_ok());

        let strict =
            Args::try_parse_from(["packbuilder", "--strict", "--work-dir", work_dir, "packs.yml"])
                .unwrap();
        let err = execute_command(&strict, document).await.unwrap_err();
        assert_eq!(err.to_string(), "1 buildpack(s) failed");
    }

    #[test]
    fn test_report_format() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("report.yml");
        let now = Utc::now();
        let summary = RunSummary {
            started_at: now,
            finished_at: now,
            packs: vec![PackReport {
                name: "go".to_string(),
                version: "1.10.0".to_string(),
                outcome: PackOutcome::Failed {
                    error: "Download error".to_string(),
                },
            }],
        };

        write_report(&summary, &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("status: failed"));
        assert!(written.contains("error: Download error"));
        assert!(written.contains("version: 1.10.0"));
    }
}
