//! Error types for the buildpack builder
//!
//! Every variant is fatal to a single pack only. The orchestrator catches them
//! at the task boundary and records them in the run summary.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the buildpack builder
#[derive(Error, Debug)]
pub enum BuilderError {
    /// Pack definition or runtime configuration is unusable
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A workspace directory could not be created
    #[error("Layout error: could not create {path}")]
    Layout {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Archive download failed
    #[error("Download error: {url}: {message}")]
    Download {
        url: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Errors related to artifact collection
    #[error("Artifact error: {message}")]
    Artifact {
        message: String,
        path: PathBuf,
        #[source]
        source: Option<std::io::Error>,
    },

    /// File system operation errors
    #[error("File system error: {operation} failed on {path}")]
    FileSystem {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Process execution errors
    #[error("Process error: {command} failed{}", exit_suffix(.exit_code))]
    Process {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String },
}

impl BuilderError {
    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error wrapping an underlying cause
    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new layout error
    pub fn layout<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::Layout {
            path: path.into(),
            source,
        }
    }

    /// Create a new download error
    pub fn download(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Download {
            url: url.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a download error wrapping the transport failure
    pub fn download_with_source(
        url: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        let source: Box<dyn std::error::Error + Send + Sync> = Box::new(source);
        Self::Download {
            url: url.into(),
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Create a new artifact error
    pub fn artifact<P: Into<PathBuf>>(
        message: impl Into<String>,
        path: P,
        source: Option<std::io::Error>,
    ) -> Self {
        Self::Artifact {
            message: message.into(),
            path: path.into(),
            source,
        }
    }

    /// Create a new file system error
    pub fn file_system<P: Into<PathBuf>>(
        operation: impl Into<String>,
        path: P,
        source: std::io::Error,
    ) -> Self {
        Self::FileSystem {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }

    /// Create a new process error
    pub fn process(
        command: impl Into<String>,
        exit_code: Option<i32>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::Process {
            command: command.into(),
            exit_code,
            stderr: stderr.into(),
            source: None,
        }
    }

    /// Create a process error for a command that could not be spawned
    pub fn spawn(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::Process {
            command: command.into(),
            exit_code: None,
            stderr: String::new(),
            source: Some(source),
        }
    }

    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

fn exit_suffix(exit_code: &Option<i32>) -> String {
    exit_code
        .map(|code| format!(" with exit code {code}"))
        .unwrap_or_default()
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, BuilderError>;
