//! Streaming HTTP downloads

use crate::error::{BuilderError, Result};
use reqwest::redirect::Policy;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

const MAX_REDIRECTS: usize = 10;

/// Downloads release archives; cheap to clone, one client is shared by all packs
#[derive(Debug, Clone)]
pub struct Downloader {
    client: reqwest::Client,
}

impl Downloader {
    /// Create a downloader that follows redirects
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(Policy::limited(MAX_REDIRECTS))
            .user_agent(concat!("packbuilder/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BuilderError::config_with_source("could not build HTTP client", e))?;
        Ok(Self { client })
    }

    /// GET `url` and stream the body into `dest`, returning the number of bytes written
    ///
    /// The body lands in `<dest>.part` first and is renamed once complete, so an
    /// interrupted transfer never leaves a plausible file at `dest`.
    #[instrument(skip(self))]
    pub async fn download_to(&self, url: &str, dest: &Path) -> Result<u64> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| BuilderError::download_with_source(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BuilderError::download(url, format!("HTTP {status}")));
        }
        if response.url().as_str() != url {
            debug!("Redirected to {}", response.url());
        }

        let partial = partial_path(dest);
        let mut file = fs::File::create(&partial)
            .await
            .map_err(|e| BuilderError::file_system("create", &partial, e))?;

        let mut size = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| BuilderError::download_with_source(url, e))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|e| BuilderError::file_system("write", &partial, e))?;
            size += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(|e| BuilderError::file_system("flush", &partial, e))?;
        drop(file);

        fs::rename(&partial, dest)
            .await
            .map_err(|e| BuilderError::file_system("rename", dest, e))?;

        Ok(size)
    }
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}
