//! Core functionality for buildpack processing
//!
//! Contains the per-pack pipeline (layout, acquisition, build, artifact
//! collection) and the orchestrator that runs it for every declared pack.

pub mod acquire;
pub mod artifacts;
pub mod builder;
pub mod layout;
pub mod orchestrator;
pub mod pack;

#[cfg(test)]
pub(crate) mod testutil;

pub use acquire::ResourceAcquirer;
pub use artifacts::ArtifactCollector;
pub use builder::PackBuilder;
pub use layout::WorkspaceLayout;
pub use orchestrator::{Orchestrator, PackOutcome, PackReport, RunSummary};
pub use pack::{AcquisitionType, BuildType, PackDefinition};
