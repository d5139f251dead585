//! # Buildpack Builder
//!
//! Fetches, builds and packages a declared set of buildpacks in parallel.
//! Each pack gets its own workspace directory, its sources are downloaded as a
//! release tarball or cloned from git, one of several build recipes runs in the
//! source tree, and the resulting `.zip` artifacts are moved into a shared
//! output directory.
//!
//! ## Features
//!
//! - YAML pack documents with per-pack acquisition and build settings
//! - Idempotent downloads, extraction and clones
//! - Bounded concurrency with per-pack failure isolation
//! - Run summary with per-pack outcomes
//!
//! ## Example
//!
//! ```no_run
//! use buildpack_builder::config::PackDocument;
//!
//! let document = PackDocument::load("packs.yml".as_ref())?;
//! for pack in &document.buildpacks {
//!     println!("{} {}", pack.qualified_name(), pack.tag());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod utils;

use anyhow::Result;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging with appropriate verbosity
pub fn setup_logging(debug: bool) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_level(true)
                .compact(),
        )
        .with(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
