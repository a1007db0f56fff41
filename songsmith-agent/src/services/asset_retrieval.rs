//! Download of the finished audio asset

use async_trait::async_trait;
use std::time::Duration;

use crate::error::SongError;

const USER_AGENT: &str = concat!("songsmith/", env!("CARGO_PKG_VERSION"));
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Fetches a remote asset into memory
#[async_trait]
pub trait AssetDownloader: Send + Sync {
    /// Single attempt; any failure is [`SongError::DownloadFailed`] carrying the URL
    async fn download_asset(&self, url: &str) -> Result<Vec<u8>, SongError>;
}

/// Plain HTTP GET downloader
pub struct HttpAssetDownloader {
    http_client: reqwest::Client,
}

impl HttpAssetDownloader {
    pub fn new() -> Result<Self, SongError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .map_err(|e| SongError::Config(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self { http_client })
    }
}

#[async_trait]
impl AssetDownloader for HttpAssetDownloader {
    async fn download_asset(&self, url: &str) -> Result<Vec<u8>, SongError> {
        let failed = |reason: String| SongError::DownloadFailed {
            url: url.to_string(),
            reason,
        };

        tracing::debug!(url = %url, "Downloading audio asset");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(failed(format!("HTTP {}", status.as_u16())));
        }

        let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;

        tracing::info!(url = %url, size_bytes = bytes.len(), "Audio asset downloaded");
        Ok(bytes.to_vec())
    }
}
