//! Pipeline stages for bill-image extraction.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. a different model provider) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! fetch ──▶ preprocess ──▶ encode ──▶ llm ──▶ normalize ──▶ reconcile
//! (URL)     (image ops)    (base64)   (VLM)   (typed rows)   (sum check)
//! ```
//!
//! 1. [`fetch`]      — download the bill image over HTTP with a bounded timeout
//! 2. [`preprocess`] — best-effort image cleanup; falls back to the original
//!    bytes on any failure
//! 3. [`encode`]     — wrap the bytes as a base64 payload for the multimodal
//!    API request body
//! 4. [`llm`]        — drive the model call with a one-shot fallback model;
//!    the only stage with model network I/O
//! 5. [`normalize`]  — permissive-then-strict parse of the model's JSON with
//!    numeric cleaning and totals
//! 6. [`reconcile`]  — compare the computed sum against the printed total

pub mod encode;
pub mod fetch;
pub mod llm;
pub mod normalize;
pub mod preprocess;
pub mod reconcile;
