//! Responder: the no-crash envelope at the API boundary.
//!
//! Clients always receive HTTP 200 with an `is_success` flag carrying the
//! real outcome. This trades REST status-code semantics for uniform
//! client-side handling — testers expecting a 4xx/5xx on failure should
//! read `is_success` and `error` instead.
//!
//! The failure shape is deliberately minimal: `is_success`, zeroed
//! `token_usage`, and an `error` string. It never carries a
//! partially-populated `data` object.

use crate::config::BillScanConfig;
use crate::error::BillScanError;
use crate::extract::extract_bill;
use crate::output::{round2, BillPage, BillReport, TokenUsage};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

/// Request body of `POST /extract-bill-data`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BillRequest {
    /// URL of the bill image to extract.
    pub document: String,
}

/// The `data` object of a successful response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillData {
    pub pagewise_line_items: Vec<BillPage>,
    pub total_item_count: usize,
    /// Sum of extracted item amounts, rounded to two decimals.
    pub reconciled_amount: f64,
    /// The grand total printed on the document, 0.0 when absent.
    pub printed_bill_total: f64,
    pub fraud_warnings: Vec<String>,
    pub preprocessing_applied: Vec<String>,
}

/// Response envelope for `/extract-bill-data`, success or failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub is_success: bool,
    pub token_usage: TokenUsage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<BillData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    /// Build the success envelope from a finished report.
    pub fn success(report: BillReport) -> Self {
        let reconciliation = report.reconciliation;
        Self {
            is_success: true,
            token_usage: report.token_usage,
            data: Some(BillData {
                pagewise_line_items: report.pages,
                total_item_count: reconciliation.total_item_count,
                reconciled_amount: round2(reconciliation.calculated_total),
                printed_bill_total: round2(reconciliation.printed_total),
                fraud_warnings: reconciliation.fraud_warnings,
                preprocessing_applied: report.preprocessing_applied,
            }),
            error: None,
        }
    }

    /// Build the failure envelope from a pipeline error.
    pub fn failure(error: &BillScanError) -> Self {
        Self {
            is_success: false,
            token_usage: TokenUsage::default(),
            data: None,
            error: Some(error.to_string()),
        }
    }
}

/// Run the full pipeline for `url` and fold the outcome into the envelope.
///
/// The single exhaustive match below is the whole "never crash" contract:
/// every error kind the pipeline can produce is converted into the failure
/// shape here, and nothing propagates past this function.
pub async fn handle_extract(url: &str, config: &BillScanConfig) -> ApiResponse {
    match extract_bill(url, config).await {
        Ok(report) => ApiResponse::success(report),
        Err(e) => {
            // Client-side problems are expected traffic; our-side failures
            // deserve a louder log line.
            match &e {
                BillScanError::InvalidInput { .. }
                | BillScanError::DownloadFailed { .. }
                | BillScanError::DownloadTimeout { .. } => {
                    warn!("Extraction request failed: {}", e);
                }
                BillScanError::ExtractionFailed { .. }
                | BillScanError::MissingLineItems
                | BillScanError::InvalidConfig(_)
                | BillScanError::Internal(_) => {
                    error!("Extraction request failed: {}", e);
                }
            }
            ApiResponse::failure(&e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::ReconciliationReport;

    fn sample_report() -> BillReport {
        BillReport {
            pages: vec![BillPage {
                page_no: "1".into(),
                page_type: "Bill Detail".into(),
                bill_items: vec![],
            }],
            reconciliation: ReconciliationReport {
                calculated_total: 350.504,
                printed_total: 350.5,
                difference: 0.004,
                fraud_warnings: vec![],
                total_item_count: 2,
            },
            preprocessing_applied: vec!["Grayscale".into()],
            token_usage: TokenUsage {
                total_tokens: 150,
                input_tokens: 120,
                output_tokens: 30,
            },
        }
    }

    #[test]
    fn success_envelope_has_data_and_no_error() {
        let resp = ApiResponse::success(sample_report());
        assert!(resp.is_success);
        assert!(resp.error.is_none());
        let data = resp.data.expect("data present");
        assert_eq!(data.total_item_count, 2);
        assert_eq!(data.reconciled_amount, 350.5);
        assert_eq!(data.printed_bill_total, 350.5);
        assert_eq!(resp.token_usage.total_tokens, 150);
    }

    #[test]
    fn success_serialisation_omits_error_field() {
        let json = serde_json::to_value(ApiResponse::success(sample_report())).unwrap();
        assert_eq!(json["is_success"], true);
        assert!(json.get("error").is_none());
        assert!(json["data"]["pagewise_line_items"].is_array());
        assert_eq!(json["token_usage"]["input_tokens"], 120);
    }

    #[test]
    fn failure_envelope_has_no_data_and_zeroed_tokens() {
        let err = BillScanError::MissingLineItems;
        let resp = ApiResponse::failure(&err);
        assert!(!resp.is_success);
        assert!(resp.data.is_none());
        assert!(resp.error.as_deref().unwrap().contains("pagewise_line_items"));
        assert_eq!(resp.token_usage, TokenUsage::default());

        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("data").is_none());
        assert_eq!(json["is_success"], false);
    }
}
