//! Error types for the billscan library.
//!
//! Every variant here is **fatal for the request**: the pipeline stops and
//! the error is handed to [`crate::respond::handle_extract`], which converts
//! it into the `is_success = false` envelope. Nothing escapes the request
//! boundary as a panic or a raw 500.
//!
//! Deliberately *not* errors:
//!
//! * Preprocessing failures — the original bytes are sent instead
//!   (see [`crate::pipeline::preprocess`]).
//! * Unparsable numeric fields in the model's output — they degrade to
//!   defaults (see [`crate::pipeline::normalize`]).

use thiserror::Error;

/// All fatal errors returned by the billscan library.
#[derive(Debug, Error)]
pub enum BillScanError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The input string is not an HTTP/HTTPS URL.
    #[error("Invalid document input '{input}': not a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// URL was syntactically valid but the download failed.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// Both model attempts failed or returned content that is not JSON.
    #[error("Extraction failed on both models. Primary: {primary}. Fallback: {fallback}")]
    ExtractionFailed { primary: String, fallback: String },

    /// The model answered with JSON, but the required `pagewise_line_items`
    /// array is structurally absent. Individual bad fields inside it never
    /// raise this — only the missing array does.
    #[error("Model response is missing the 'pagewise_line_items' array")]
    MissingLineItems,

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_failed_display() {
        let e = BillScanError::DownloadFailed {
            url: "https://example.com/bill.png".into(),
            reason: "HTTP 404 Not Found".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("bill.png"), "got: {msg}");
        assert!(msg.contains("404"), "got: {msg}");
    }

    #[test]
    fn download_timeout_display() {
        let e = BillScanError::DownloadTimeout {
            url: "https://example.com/bill.png".into(),
            secs: 30,
        };
        assert!(e.to_string().contains("30s"));
    }

    #[test]
    fn extraction_failed_carries_both_reasons() {
        let e = BillScanError::ExtractionFailed {
            primary: "HTTP 503".into(),
            fallback: "response is not JSON".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("HTTP 503"));
        assert!(msg.contains("not JSON"));
    }

    #[test]
    fn missing_line_items_display() {
        let msg = BillScanError::MissingLineItems.to_string();
        assert!(msg.contains("pagewise_line_items"));
    }
}
