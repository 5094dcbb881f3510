//! Pipeline orchestration: run every stage in order for one request.
//!
//! Each request is fully independent — fetch → preprocess → encode →
//! extract → normalize → reconcile, sequentially, with no state shared
//! between requests. Suspension happens only at the two I/O boundaries
//! (image download, model call), both of which carry their own timeouts.

use crate::config::BillScanConfig;
use crate::error::BillScanError;
use crate::output::{BillReport, ReconciliationReport};
use crate::pipeline::{encode, fetch, llm, normalize, preprocess, reconcile};
use std::time::Instant;
use tracing::{debug, info};

/// Extract and reconcile the bill at `url`.
///
/// This is the primary entry point for the library; the HTTP layer wraps it
/// via [`crate::respond::handle_extract`].
///
/// # Errors
/// Any [`BillScanError`] from the stages: bad input URL, download failure,
/// both model attempts failing, or a structurally missing line-item array.
pub async fn extract_bill(
    url: impl AsRef<str>,
    config: &BillScanConfig,
) -> Result<BillReport, BillScanError> {
    let url = url.as_ref();
    info!("Starting bill extraction: {}", url);

    let bytes = fetch::download(url, config.download_timeout_secs).await?;
    extract_from_bytes(&bytes, config).await
}

/// Extract and reconcile a bill image already held in memory.
///
/// Skips the download stage; used when the image comes from an upload or a
/// test fixture rather than a URL.
pub async fn extract_from_bytes(
    bytes: &[u8],
    config: &BillScanConfig,
) -> Result<BillReport, BillScanError> {
    let total_start = Instant::now();

    // ── Preprocess (best-effort) ─────────────────────────────────────────
    let (image_bytes, preprocessing_applied) = if config.preprocess {
        preprocess::preprocess(bytes)
    } else {
        (bytes.to_vec(), Vec::new())
    };

    // ── Encode for the multimodal request body ───────────────────────────
    let payload = encode::encode_image(&image_bytes);

    // ── Model extraction (primary + one fallback) ────────────────────────
    let llm_start = Instant::now();
    let (raw, token_usage) = llm::extract_structured(&payload, config).await?;
    debug!("Model stage took {}ms", llm_start.elapsed().as_millis());

    // ── Normalize into typed records ─────────────────────────────────────
    let normalized = normalize::normalize(&raw)?;

    // ── Reconcile against the printed total ──────────────────────────────
    let outcome = reconcile::reconcile(
        normalized.calculated_total,
        normalized.printed_total,
        config.reconcile_tolerance,
    );

    // Model-supplied flags first, the mathematical check appended after,
    // matching the order a reviewer reads them in.
    let mut fraud_warnings = normalized.model_flags;
    if let Some(warning) = outcome.warning {
        fraud_warnings.push(warning);
    }

    info!(
        "Extraction complete: {} items across {} pages in {}ms (check {})",
        normalized.total_item_count,
        normalized.pages.len(),
        total_start.elapsed().as_millis(),
        if outcome.skipped { "skipped" } else { "run" }
    );

    Ok(BillReport {
        pages: normalized.pages,
        reconciliation: ReconciliationReport {
            calculated_total: normalized.calculated_total,
            printed_total: normalized.printed_total,
            difference: outcome.difference,
            fraud_warnings,
            total_item_count: normalized.total_item_count,
        },
        preprocessing_applied,
        token_usage,
    })
}
