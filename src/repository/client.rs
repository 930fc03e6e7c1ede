// src/repository/client.rs

//! HTTP client for upstream repository metadata
//!
//! Thin wrapper around reqwest's blocking client. Requests are bounded by
//! a timeout; the number of attempts is configurable and defaults to one.

use crate::compression::{self, CompressionFormat};
use crate::error::{Error, Result};
use reqwest::blocking::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Default timeout for HTTP requests (30 seconds)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Delay between attempts, multiplied by the attempt number
const RETRY_DELAY_MS: u64 = 1000;

/// HTTP client used by repository listers
pub struct RepositoryClient {
    client: Client,
    max_attempts: u32,
}

impl RepositoryClient {
    /// Create a client with the default timeout and a single attempt
    pub fn new() -> Result<Self> {
        Self::with_settings(DEFAULT_TIMEOUT, 1)
    }

    /// Create a client with an explicit timeout and attempt budget
    pub fn with_settings(timeout: Duration, max_attempts: u32) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("channel-export/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::InitError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_attempts: max_attempts.max(1),
        })
    }

    /// Fetch a URL into memory
    pub fn download_to_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_download(url) {
                Ok(bytes) => return Ok(bytes),
                Err(e) if attempt >= self.max_attempts => return Err(e),
                Err(e) => {
                    warn!("Fetch attempt {} for {} failed: {}, retrying...", attempt, url, e);
                    std::thread::sleep(Duration::from_millis(RETRY_DELAY_MS * attempt as u64));
                }
            }
        }
    }

    fn try_download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| Error::DownloadError(format!("Failed to fetch {url}: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::DownloadError(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        let bytes = response
            .bytes()
            .map_err(|e| Error::DownloadError(format!("Failed to read response from {url}: {e}")))?;

        Ok(bytes.to_vec())
    }
}

/// Source of raw repository metadata bytes
///
/// `RepositoryClient` fetches over HTTP; listers are generic over this so
/// repository layouts can be exercised without a network.
pub trait MetadataFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

impl MetadataFetcher for RepositoryClient {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.download_to_bytes(url)
    }
}

/// Decompress a metadata body fetched from `url`
///
/// The format is detected from magic bytes. A URL whose extension
/// promises compression but whose body is not compressed is rejected,
/// since that usually means an HTML error page from a misconfigured mirror.
pub fn decode_metadata(url: &str, bytes: &[u8]) -> Result<Vec<u8>> {
    let detected = CompressionFormat::from_magic_bytes(bytes);
    let hinted = CompressionFormat::from_extension(url);
    if detected == CompressionFormat::None && hinted != CompressionFormat::None {
        return Err(Error::ParseError(format!(
            "Expected {hinted} data from {url}, got uncompressed content"
        )));
    }

    let decompressed = compression::decompress(bytes, detected).map_err(|e| {
        Error::ParseError(format!("Failed to decompress data from {url}: {e}"))
    })?;

    debug!(
        "Decoded {} ({}): {} bytes -> {} bytes",
        url,
        detected,
        bytes.len(),
        decompressed.len()
    );
    Ok(decompressed)
}
