//! Normalizer: turn the model's loose JSON into typed bill records.
//!
//! ## Two-stage parse
//!
//! The model's reply is first accepted as a fully permissive
//! [`serde_json::Value`] (stage one, done by the Extractor), then walked
//! field by field into strict records here (stage two). The walk applies the
//! numeric-cleaning and defaulting rules explicitly, so the only structural
//! failure this stage can raise is a missing `pagewise_line_items` array —
//! never an individual bad number.
//!
//! ## Lenient degradation
//!
//! A numeric field that stays unparsable after cleaning becomes its default
//! (amount and rate 0.0, quantity 1.0) instead of failing the request. This
//! can understate `calculated_total` and thereby mask the very discrepancy
//! the reconciliation step exists to catch; the policy is preserved from the
//! source behaviour and is flagged for review in DESIGN.md rather than
//! silently hardened.

use crate::error::BillScanError;
use crate::output::{BillItem, BillPage};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

/// The normalized extraction, before reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedExtraction {
    pub pages: Vec<BillPage>,
    /// Sum of `item_amount` over every item on every page.
    pub calculated_total: f64,
    /// Count of all items over all pages.
    pub total_item_count: usize,
    /// The printed grand total, 0.0 when absent or unparsable.
    pub printed_total: f64,
    /// Fraud flags supplied by the model itself (non-strings dropped).
    pub model_flags: Vec<String>,
}

/// Normalize the raw extraction JSON.
///
/// Fails only when `pagewise_line_items` is structurally absent (not an
/// array, or the reply is not an object at all).
pub fn normalize(raw: &Value) -> Result<NormalizedExtraction, BillScanError> {
    let raw_pages = raw
        .get("pagewise_line_items")
        .and_then(Value::as_array)
        .ok_or(BillScanError::MissingLineItems)?;

    let mut pages = Vec::with_capacity(raw_pages.len());
    let mut calculated_total = 0.0;
    let mut total_item_count = 0;

    for raw_page in raw_pages {
        let page = normalize_page(raw_page);
        calculated_total += page.bill_items.iter().map(|i| i.item_amount).sum::<f64>();
        total_item_count += page.bill_items.len();
        pages.push(page);
    }

    let printed_total = raw
        .get("invoice_total")
        .and_then(clean_number)
        .unwrap_or(0.0);

    let model_flags = raw
        .get("fraud_flags")
        .and_then(Value::as_array)
        .map(|flags| {
            flags
                .iter()
                .filter_map(|f| f.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    debug!(
        "Normalized {} pages, {} items, calculated total {:.2}, printed total {:.2}",
        pages.len(),
        total_item_count,
        calculated_total,
        printed_total
    );

    Ok(NormalizedExtraction {
        pages,
        calculated_total,
        total_item_count,
        printed_total,
        model_flags,
    })
}

fn normalize_page(raw: &Value) -> BillPage {
    let page_no = string_or(raw.get("page_no"), "1");
    let page_type = string_or(raw.get("page_type"), "Bill Detail");

    let bill_items = raw
        .get("bill_items")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(normalize_item).collect())
        .unwrap_or_default();

    BillPage {
        page_no,
        page_type,
        bill_items,
    }
}

fn normalize_item(raw: &Value) -> BillItem {
    BillItem {
        item_name: string_or(raw.get("item_name"), "Unknown"),
        item_quantity: raw.get("item_quantity").and_then(clean_number).unwrap_or(1.0),
        item_rate: raw.get("item_rate").and_then(clean_number).unwrap_or(0.0),
        item_amount: raw.get("item_amount").and_then(clean_number).unwrap_or(0.0),
    }
}

/// Render a JSON value as a display string, falling back to `default` for
/// null/absent. Numbers become their JSON rendering ("1" for page 1).
fn string_or(value: Option<&Value>, default: &str) -> String {
    match value {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Null) | None => default.to_string(),
        Some(other) => match other {
            Value::Number(n) => n.to_string(),
            _ => default.to_string(),
        },
    }
}

// Currency symbols, thousands separators, and whitespace that appear in
// model-extracted amounts.
static RE_NUMERIC_NOISE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,\s$€£₹¥]").unwrap());

/// Coerce a JSON value to a float after cleaning numeric noise.
///
/// JSON numbers pass through; strings have commas, currency symbols, and
/// whitespace stripped before parsing. Anything else is `None`, and the
/// caller picks the field's default.
pub fn clean_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned = RE_NUMERIC_NOISE.replace_all(s, "");
            if cleaned.is_empty() {
                None
            } else {
                cleaned.parse::<f64>().ok()
            }
        }
        _ => None,
    }
}
