#![allow(clippy::cargo_common_metadata)]
use anyhow::{Context, Result};
use buildpack_builder::{cli, config::PackDocument, setup_logging};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = cli::parse_args();

    // The document can turn debug on as well, so it is read before logging starts
    let document = PackDocument::load(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;

    setup_logging(args.debug || document.debug)?;

    cli::execute_command(&args, document).await
}
