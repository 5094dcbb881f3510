//! Typed records produced by the extraction pipeline.
//!
//! Everything in this module lives for exactly one request: built by
//! [`crate::pipeline::normalize`], enriched by
//! [`crate::pipeline::reconcile`], serialised by [`crate::respond`], then
//! dropped. No identity, no versioning, no storage.
//!
//! Field names match the wire contract of the `/extract-bill-data` endpoint
//! exactly, so these structs serialise straight into the response body.

use serde::{Deserialize, Serialize};

/// One row of a bill's item table.
///
/// Numeric fields have already been cleaned: thousands separators, currency
/// symbols, and whitespace stripped, unparsable values defaulted (amount and
/// rate to `0.0`, quantity to `1.0`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillItem {
    pub item_name: String,
    pub item_quantity: f64,
    pub item_rate: f64,
    pub item_amount: f64,
}

/// All line items extracted from a single page of the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillPage {
    /// Page number as printed, kept as a string ("1", "2 of 3", …).
    pub page_no: String,
    /// Free-text page classification: "Bill Detail", "Final Bill",
    /// "Pharmacy", or whatever the model reports.
    pub page_type: String,
    pub bill_items: Vec<BillItem>,
}

/// Token counts reported by the model API, zeroed when unavailable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub total_tokens: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Outcome of comparing the computed sum against the printed total.
///
/// Produced by [`crate::pipeline::reconcile::reconcile`]; a pure function of
/// two numbers and a tolerance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    /// Sum of `item_amount` over every item on every page.
    pub calculated_total: f64,
    /// The grand total printed on the document, 0.0 when absent.
    pub printed_total: f64,
    /// `|calculated_total - printed_total|`.
    pub difference: f64,
    /// Human-readable discrepancy warnings. Not a determination of fraud.
    pub fraud_warnings: Vec<String>,
    /// Count of all items over all pages.
    pub total_item_count: usize,
}

/// The fully normalized and reconciled result of one extraction run.
#[derive(Debug, Clone)]
pub struct BillReport {
    pub pages: Vec<BillPage>,
    pub reconciliation: ReconciliationReport,
    /// Ordered names of the preprocessing steps that actually ran.
    pub preprocessing_applied: Vec<String>,
    pub token_usage: TokenUsage,
}

impl BillReport {
    /// Total number of line items across all pages.
    pub fn item_count(&self) -> usize {
        self.reconciliation.total_item_count
    }
}

/// Round to two decimals for presentation.
///
/// Applied at the envelope boundary only; internal arithmetic keeps full
/// f64 precision so the tolerance check is not affected by rounding.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
