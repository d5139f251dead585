//! Command-line argument parsing and validation

use clap::Parser;
use std::path::PathBuf;

/// Buildpack Builder - fetches, builds and packages buildpacks in parallel
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "packbuilder")]
pub struct Args {
    /// YAML document listing the buildpacks to process
    pub config: PathBuf,

    /// Enable debug output and stream build tool output
    #[arg(long)]
    pub debug: bool,

    /// Maximum number of packs processed at once (default: unbounded)
    #[arg(short = 'j', long)]
    pub jobs: Option<usize>,

    /// Directory the pack workspaces and `out/` are created in (default: current directory)
    #[arg(long = "work-dir")]
    pub work_dir: Option<PathBuf>,

    /// Collect each pack's artifacts into `out/<name>/` instead of a flat `out/`
    #[arg(long = "namespace-artifacts")]
    pub namespace_artifacts: bool,

    /// Write the run summary as YAML to this file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Exit with an error if any pack failed
    #[arg(long)]
    pub strict: bool,
}

/// Parse command line arguments
pub fn parse_args() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_args() {
        let args = Args::try_parse_from(["packbuilder", "packs.yml"]).unwrap();
        assert_eq!(args.config, PathBuf::from("packs.yml"));
        assert!(!args.debug);
        assert!(args.jobs.is_none());
        assert!(args.work_dir.is_none());
        assert!(!args.namespace_artifacts);
        assert!(!args.strict);
    }

    #[test]
    fn test_parse_all_options() {
        let args = Args::try_parse_from([
            "packbuilder",
            "--debug",
            "-j",
            "4",
            "--work-dir",
            "/tmp/build",
            "--namespace-artifacts",
            "--report",
            "summary.yml",
            "--strict",
            "packs.yml",
        ])
        .unwrap();
        assert!(args.debug);
        assert_eq!(args.jobs, Some(4));
        assert_eq!(args.work_dir, Some(PathBuf::from("/tmp/build")));
        assert!(args.namespace_artifacts);
        assert_eq!(args.report, Some(PathBuf::from("summary.yml")));
        assert!(args.strict);
    }

    #[test]
    fn test_config_path_is_required() {
        assert!(Args::try_parse_from(["packbuilder", "--debug"]).is_err());
    }

    #[test]
    fn test_jobs_must_be_a_number() {
        assert!(Args::try_parse_from(["packbuilder", "--jobs", "many", "packs.yml"]).is_err());
    }
}
