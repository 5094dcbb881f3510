//! # billscan
//!
//! Extract structured line items from medical-bill images using Vision
//! Language Models (VLMs), and reconcile the extracted sum against the
//! total printed on the document.
//!
//! ## Why this crate?
//!
//! Classical OCR turns a bill photo into a soup of words with no row
//! structure; totals, subtotals, and line items come out interleaved.
//! Instead this crate sends the image to a VLM with a strict JSON contract
//! and treats the reply as *untrusted data*: every numeric field is cleaned
//! and re-typed, the item amounts are re-summed, and the sum is checked
//! against the printed grand total. A mismatch beyond the tolerance becomes
//! a human-readable fraud warning in the response.
//!
//! ## Pipeline Overview
//!
//! ```text
//! URL
//!  │
//!  ├─ 1. Fetch       download the bill image (bounded timeout)
//!  ├─ 2. Preprocess  grayscale / denoise / adaptive threshold (best-effort)
//!  ├─ 3. Encode      bytes → base64 inline payload
//!  ├─ 4. Extract     Gemini call, strict-JSON contract, one fallback model
//!  ├─ 5. Normalize   clean numeric strings into typed records, sum totals
//!  ├─ 6. Reconcile   |sum − printed| > tolerance → fraud warning
//!  └─ 7. Respond     is_success envelope, never a crash or a raw 500
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use billscan::{handle_extract, BillScanConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BillScanConfig::builder()
//!         .api_key(std::env::var("GEMINI_API_KEY")?)
//!         .build()?;
//!     let response = handle_extract("https://example.com/bill.png", &config).await;
//!     println!("{}", serde_json::to_string_pretty(&response)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | Enables the `billscan` HTTP server binary (axum + clap + tracing-subscriber) |
//!
//! Disable `server` when using only the library to avoid pulling in
//! server-only deps:
//! ```toml
//! billscan = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod respond;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{BillScanConfig, BillScanConfigBuilder};
pub use error::BillScanError;
pub use extract::{extract_bill, extract_from_bytes};
pub use output::{BillItem, BillPage, BillReport, ReconciliationReport, TokenUsage};
pub use pipeline::encode::ImagePayload;
pub use pipeline::llm::{ModelError, ModelReply, VisionModel};
pub use respond::{handle_extract, ApiResponse, BillData, BillRequest};
