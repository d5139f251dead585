//! Utility modules for common functionality
//!
//! Provides reusable utilities for file operations, HTTP downloads
//! and process execution.

pub mod fs;
pub mod http;
pub mod process;

pub use fs::FileSystemUtils;
pub use http::Downloader;
pub use process::ProcessRunner;
