use std::time::Duration;

use crate::migration::api::ArtifactDownloader;
use crate::migration::error::{MigrationError, MigrationResult};

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Fetches export artifacts over HTTPS
pub struct HttpDownloader {
    client: reqwest::blocking::Client,
}

impl HttpDownloader {
    pub fn new() -> MigrationResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .map_err(|e| MigrationError::remote("DownloadAssetBundle", e.to_string()))?;
        Ok(Self { client })
    }
}

impl ArtifactDownloader for HttpDownloader {
    fn download(&self, url: &str) -> MigrationResult<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| MigrationError::remote("DownloadAssetBundle", e.to_string()))?;
        let bytes = response
            .bytes()
            .map_err(|e| MigrationError::remote("DownloadAssetBundle", e.to_string()))?;

        tracing::debug!(size = bytes.len(), "Downloaded asset bundle");
        Ok(bytes.to_vec())
    }
}
