//! Configuration for the extraction pipeline.
//!
//! All behaviour is controlled through [`BillScanConfig`], built via its
//! [`BillScanConfigBuilder`]. The config is created once at startup,
//! immutable thereafter, and threaded explicitly through every stage —
//! there is no ambient global state (no `lazy_static` API key, no
//! process-wide model client).
//!
//! # Design choice: builder over constructor
//! Callers set only what they care about and rely on documented defaults
//! for the rest; adding a field later does not break any call site.

use crate::error::BillScanError;
use crate::pipeline::llm::VisionModel;
use std::fmt;
use std::sync::Arc;

/// Configuration for a bill-extraction run.
///
/// # Example
/// ```rust
/// use billscan::BillScanConfig;
///
/// let config = BillScanConfig::builder()
///     .api_key("AIza...")
///     .reconcile_tolerance(1.0)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct BillScanConfig {
    /// API key for the Gemini endpoint. May be empty when a custom
    /// [`model`](Self::model) is injected (tests, alternative providers).
    pub api_key: String,

    /// Base URL of the model API. Default:
    /// `https://generativelanguage.googleapis.com`. Overridable for proxies
    /// and tests.
    pub api_base_url: String,

    /// Model tried first. Default: "gemini-flash-latest".
    pub primary_model: String,

    /// Model tried once if the primary attempt fails or returns non-JSON.
    /// Default: "gemini-1.5-flash".
    pub fallback_model: String,

    /// Absolute difference between the computed sum and the printed total
    /// that is tolerated before a warning is emitted. Default: 1.0.
    ///
    /// Small printed totals are routinely off by paise/cent rounding, so a
    /// tolerance of exactly zero would flag nearly every real bill.
    pub reconcile_tolerance: f64,

    /// Image download timeout in seconds. Default: 30.
    pub download_timeout_secs: u64,

    /// Per-model-call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Whether to run the image-cleanup pass before extraction. Default: true.
    pub preprocess: bool,

    /// Pre-constructed model client. Takes precedence over the built-in
    /// Gemini client; used to inject mocks in tests.
    pub model: Option<Arc<dyn VisionModel>>,
}

impl Default for BillScanConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base_url: "https://generativelanguage.googleapis.com".to_string(),
            primary_model: "gemini-flash-latest".to_string(),
            fallback_model: "gemini-1.5-flash".to_string(),
            reconcile_tolerance: 1.0,
            download_timeout_secs: 30,
            api_timeout_secs: 60,
            preprocess: true,
            model: None,
        }
    }
}

impl fmt::Debug for BillScanConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BillScanConfig")
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("api_base_url", &self.api_base_url)
            .field("primary_model", &self.primary_model)
            .field("fallback_model", &self.fallback_model)
            .field("reconcile_tolerance", &self.reconcile_tolerance)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("preprocess", &self.preprocess)
            .field("model", &self.model.as_ref().map(|_| "<dyn VisionModel>"))
            .finish()
    }
}

impl BillScanConfig {
    /// Create a new builder for `BillScanConfig`.
    pub fn builder() -> BillScanConfigBuilder {
        BillScanConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`BillScanConfig`].
#[derive(Debug)]
pub struct BillScanConfigBuilder {
    config: BillScanConfig,
}

impl BillScanConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.config.api_base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn primary_model(mut self, model: impl Into<String>) -> Self {
        self.config.primary_model = model.into();
        self
    }

    pub fn fallback_model(mut self, model: impl Into<String>) -> Self {
        self.config.fallback_model = model.into();
        self
    }

    pub fn reconcile_tolerance(mut self, tolerance: f64) -> Self {
        self.config.reconcile_tolerance = tolerance;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs.max(1);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn preprocess(mut self, v: bool) -> Self {
        self.config.preprocess = v;
        self
    }

    pub fn model(mut self, model: Arc<dyn VisionModel>) -> Self {
        self.config.model = Some(model);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<BillScanConfig, BillScanError> {
        let c = &self.config;
        if !c.reconcile_tolerance.is_finite() || c.reconcile_tolerance < 0.0 {
            return Err(BillScanError::InvalidConfig(format!(
                "reconcile_tolerance must be a finite number ≥ 0, got {}",
                c.reconcile_tolerance
            )));
        }
        if c.primary_model.is_empty() {
            return Err(BillScanError::InvalidConfig(
                "primary_model must not be empty".into(),
            ));
        }
        if c.api_key.is_empty() && c.model.is_none() {
            return Err(BillScanError::InvalidConfig(
                "api_key is required unless a custom model client is provided".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_contract() {
        let c = BillScanConfig::default();
        assert_eq!(c.primary_model, "gemini-flash-latest");
        assert_eq!(c.fallback_model, "gemini-1.5-flash");
        assert_eq!(c.reconcile_tolerance, 1.0);
        assert!(c.preprocess);
    }

    #[test]
    fn builder_rejects_negative_tolerance() {
        let err = BillScanConfig::builder()
            .api_key("k")
            .reconcile_tolerance(-0.5)
            .build()
            .unwrap_err();
        assert!(matches!(err, BillScanError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_nan_tolerance() {
        let err = BillScanConfig::builder()
            .api_key("k")
            .reconcile_tolerance(f64::NAN)
            .build()
            .unwrap_err();
        assert!(matches!(err, BillScanError::InvalidConfig(_)));
    }

    #[test]
    fn builder_requires_api_key_without_custom_model() {
        let err = BillScanConfig::builder().build().unwrap_err();
        assert!(matches!(err, BillScanError::InvalidConfig(_)));
    }

    #[test]
    fn builder_trims_trailing_slash_from_base_url() {
        let c = BillScanConfig::builder()
            .api_key("k")
            .api_base_url("https://example.com/")
            .build()
            .unwrap();
        assert_eq!(c.api_base_url, "https://example.com");
    }

    #[test]
    fn debug_redacts_api_key() {
        let c = BillScanConfig::builder().api_key("secret").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("secret"));
        assert!(dbg.contains("<redacted>"));
    }
}
