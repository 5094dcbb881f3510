//! Fetcher: download the bill image from a user-supplied URL.
//!
//! The whole document stays in memory — bill images are single-page photos
//! or scans, well under typical API upload limits, so there is no temp-file
//! round trip. Non-2xx statuses are surfaced with the status line in the
//! error reason so callers can tell a 404 from a 503 without a debugger.

use crate::error::BillScanError;
use std::time::Duration;
use tracing::{debug, info};

/// Check if the input string looks like a URL we will fetch.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Download the document at `url`, honouring `timeout_secs`.
///
/// No retries: a bill upload is interactive, and the client is better placed
/// to decide whether to resubmit than this service is to guess.
pub async fn download(url: &str, timeout_secs: u64) -> Result<Vec<u8>, BillScanError> {
    if !is_url(url) {
        return Err(BillScanError::InvalidInput {
            input: url.to_string(),
        });
    }

    info!("Downloading bill image from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| BillScanError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            BillScanError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            BillScanError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(BillScanError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| BillScanError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    debug!("Downloaded {} bytes", bytes.len());
    Ok(bytes.to_vec())
}
