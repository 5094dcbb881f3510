//! The instructional prompt sent with every bill image.
//!
//! Centralising the prompt here serves two purposes:
//!
//! 1. **Single source of truth** — tightening an extraction rule (e.g. what
//!    counts as a line item) requires editing exactly one place.
//!
//! 2. **Testability** — unit tests can assert on the prompt's contract
//!    (required keys, exclusion rules) without calling a real model.

/// Extraction prompt for a medical-bill or invoice image.
///
/// The response contract is enforced twice: here in prose, and again by
/// forcing `response_mime_type: application/json` on the API call. Rows such
/// as subtotals and taxes are excluded at the prompt level because filtering
/// them out after the fact would require re-deriving which rows the model
/// merged.
pub const EXTRACTION_PROMPT: &str = r#"You are an automated data extraction system. Analyze this invoice image.

TASK 1: Extract ALL line items from the main item table.
TASK 2: Extract the final "Grand Total" or "Net Payable" printed on the document.

CRITICAL RULES:
1. Output MUST be valid JSON.
2. Extract every single row in the item table. Do NOT stop after a few items.
3. Ignore 'Category Total', 'Subtotal', 'Tax', 'VAT' rows — they are not line items.
4. Put ALL items of a page into that page's 'bill_items' list.
5. Set 'page_type' to one of "Bill Detail", "Final Bill", "Pharmacy", or a short free-text label.
6. Optionally list anything suspicious (altered digits, mismatched fonts) in 'fraud_flags'.

REQUIRED JSON STRUCTURE:
{
  "invoice_total": 1500.00,
  "pagewise_line_items": [
    {
      "page_no": "1",
      "page_type": "Bill Detail",
      "bill_items": [
        { "item_name": "Item Name", "item_amount": 100.00, "item_rate": 10.00, "item_quantity": 10 }
      ]
    }
  ],
  "fraud_flags": []
}"#;
