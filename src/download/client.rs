//! HTTP client wrapper for documentation pages and artifact downloads.
//!
//! This module provides the `HttpClient` struct which handles page fetches
//! and streaming downloads with timeout configuration and typed errors.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::DownloadError;
use crate::user_agent::BROWSER_USER_AGENT;

/// HTTP client shared by the scraper and the artifact downloader.
///
/// Every request carries a desktop-browser User-Agent so the documentation
/// host serves the same markup a person would see.
///
/// # Example
///
/// ```no_run
/// use toolchain_mirror::HttpClient;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new()?;
/// let url = url::Url::parse("https://dl.espressif.com/dl/tools.zip")?;
/// let bytes = client.download_to_path(&url, Path::new("toolchains/linux/tools.zip")).await?;
/// println!("wrote {bytes} bytes");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a client with default timeouts (30s connect, 5min read).
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::ClientBuild`] if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self, DownloadError> {
        Self::new_with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a client with explicit timeout values.
    ///
    /// The read timeout bounds each wait for data, not the whole transfer,
    /// so a slow but steady download of a large archive is never cut off.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::ClientBuild`] if the TLS backend cannot be initialized.
    pub fn new_with_timeouts(
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .read_timeout(Duration::from_secs(read_timeout_secs))
            .gzip(true)
            .user_agent(BROWSER_USER_AGENT)
            .build()
            .map_err(DownloadError::ClientBuild)?;
        Ok(Self { client })
    }

    /// Fetches a page body as text.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::HttpStatus`] for non-2xx responses, or a
    /// network/timeout error if the request or body read fails.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch_text(&self, url: &Url) -> Result<String, DownloadError> {
        let response = self.send_get(url).await?;
        response
            .text()
            .await
            .map_err(|e| DownloadError::network(url.as_str(), e))
    }

    /// Streams `url` into `dest`, creating or truncating the file.
    ///
    /// There is no retry, and a failed transfer leaves whatever was written
    /// in place.
    ///
    /// # Returns
    ///
    /// The number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::HttpStatus`] for non-2xx responses, a
    /// network/timeout error for transfer failures, or [`DownloadError::Io`]
    /// if the file cannot be created or written.
    #[instrument(skip(self, dest), fields(url = %url, path = %dest.display()))]
    pub async fn download_to_path(&self, url: &Url, dest: &Path) -> Result<u64, DownloadError> {
        debug!("starting download");
        let response = self.send_get(url).await?;

        let mut file = File::create(dest)
            .await
            .map_err(|e| DownloadError::io(dest, e))?;

        let bytes = stream_to_file(&mut file, response, url.as_str(), dest).await?;

        info!(path = %dest.display(), bytes, "download complete");
        Ok(bytes)
    }

    async fn send_get(&self, url: &Url) -> Result<reqwest::Response, DownloadError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| DownloadError::network(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url.as_str(), status.as_u16()));
        }
        Ok(response)
    }
}

/// Streams response body to file, returning bytes written.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::network(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path, e))?;

        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;

    Ok(bytes_written)
}
