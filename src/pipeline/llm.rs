//! Extractor: drive the vision model call and its one-shot fallback.
//!
//! This module is intentionally thin — all prompt engineering lives in
//! [`crate::prompts`] so it can be changed without touching fallback or
//! error-handling logic here.
//!
//! ## Fallback strategy
//!
//! Exactly two attempts: the primary model, then the fallback model. Any
//! failure mode triggers the switch — transport error, non-2xx status,
//! empty candidates, or reply text that does not parse as JSON. Only when
//! both attempts fail does the request fail, with both reasons preserved
//! in [`BillScanError::ExtractionFailed`].

use crate::config::BillScanConfig;
use crate::error::BillScanError;
use crate::output::TokenUsage;
use crate::pipeline::encode::ImagePayload;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// A single model reply: raw text plus the provider's token accounting.
#[derive(Debug, Clone)]
pub struct ModelReply {
    pub text: String,
    pub usage: TokenUsage,
}

/// Per-attempt failure. Non-fatal on its own — the caller decides whether
/// a fallback attempt remains before escalating to
/// [`BillScanError::ExtractionFailed`].
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    /// The API answered with a non-2xx status.
    #[error("HTTP {status}: {detail}")]
    Api { status: u16, detail: String },

    /// The request never completed (connection refused, DNS, TLS, …).
    #[error("transport error: {0}")]
    Transport(String),

    /// The call exceeded the configured timeout.
    #[error("model call timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The API answered 2xx but carried no usable text candidate.
    #[error("model returned no text candidates")]
    EmptyResponse,
}

/// Seam between the pipeline and the model provider.
///
/// The built-in implementation is [`GeminiClient`]; tests inject scripted
/// implementations through [`BillScanConfig::model`].
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Send `image` and `prompt` to the named model and return its reply.
    async fn generate(
        &self,
        model_id: &str,
        image: &ImagePayload,
        prompt: &str,
    ) -> Result<ModelReply, ModelError>;
}

/// Call the model with the extraction prompt, falling back once.
///
/// Returns the reply parsed as a JSON [`Value`] (the Normalizer applies the
/// strict typing) together with the token usage of the attempt that
/// succeeded.
pub async fn extract_structured(
    image: &ImagePayload,
    config: &BillScanConfig,
) -> Result<(Value, TokenUsage), BillScanError> {
    let model: Arc<dyn VisionModel> = match &config.model {
        Some(m) => Arc::clone(m),
        None => Arc::new(GeminiClient::from_config(config)),
    };

    let primary_reason = match attempt(&*model, &config.primary_model, image).await {
        Ok(ok) => return Ok(ok),
        Err(reason) => reason,
    };

    warn!(
        "Model {} failed ({}), retrying with fallback {}",
        config.primary_model, primary_reason, config.fallback_model
    );

    match attempt(&*model, &config.fallback_model, image).await {
        Ok(ok) => Ok(ok),
        Err(fallback_reason) => Err(BillScanError::ExtractionFailed {
            primary: primary_reason,
            fallback: fallback_reason,
        }),
    }
}

/// One attempt against one model id. The error is a human-readable reason
/// string, ready for [`BillScanError::ExtractionFailed`].
async fn attempt(
    model: &dyn VisionModel,
    model_id: &str,
    image: &ImagePayload,
) -> Result<(Value, TokenUsage), String> {
    info!("Sending extraction request to {}", model_id);

    let reply = model
        .generate(model_id, image, crate::prompts::EXTRACTION_PROMPT)
        .await
        .map_err(|e| e.to_string())?;

    let text = strip_json_fences(&reply.text);
    match serde_json::from_str::<Value>(text) {
        Ok(value) => {
            debug!(
                "Model {} replied with {} bytes of JSON ({} tokens)",
                model_id,
                text.len(),
                reply.usage.total_tokens
            );
            Ok((value, reply.usage))
        }
        Err(e) => Err(format!("response is not valid JSON: {e}")),
    }
}

// Models occasionally wrap JSON in ```json fences despite the forced mime
// type; strip one outer fence pair before parsing.
static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json)?\s*\n?(.*?)\n?```\s*$").unwrap());

fn strip_json_fences(input: &str) -> &str {
    match RE_OUTER_FENCES.captures(input.trim()) {
        Some(caps) => caps.get(1).map(|m| m.as_str()).unwrap_or(input),
        None => input.trim(),
    }
}

// ── Gemini REST client ───────────────────────────────────────────────────

/// Built-in client for the Gemini `generateContent` REST endpoint.
///
/// The response format is forced to `application/json` via
/// `generationConfig.responseMimeType`, which is what makes the
/// strict-JSON contract in [`crate::prompts`] enforceable rather than
/// aspirational.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout_secs: u64,
}

impl GeminiClient {
    pub fn from_config(config: &BillScanConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.api_base_url.clone(),
            api_key: config.api_key.clone(),
            timeout_secs: config.api_timeout_secs,
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: RequestGenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
enum RequestPart<'a> {
    #[serde(rename = "inline_data")]
    InlineData {
        mime_type: &'a str,
        data: &'a str,
    },
    #[serde(rename = "text")]
    Text(&'a str),
}

#[derive(Debug, Serialize)]
struct RequestGenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
    #[serde(rename = "usageMetadata", default)]
    usage_metadata: Option<ResponseUsage>,
}

#[derive(Debug, Deserialize)]
struct ResponseCandidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseUsage {
    #[serde(rename = "promptTokenCount", default)]
    prompt_token_count: u64,
    #[serde(rename = "candidatesTokenCount", default)]
    candidates_token_count: u64,
    #[serde(rename = "totalTokenCount", default)]
    total_token_count: u64,
}

#[async_trait]
impl VisionModel for GeminiClient {
    async fn generate(
        &self,
        model_id: &str,
        image: &ImagePayload,
        prompt: &str,
    ) -> Result<ModelReply, ModelError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, model_id, self.api_key
        );

        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![
                    RequestPart::InlineData {
                        mime_type: &image.mime_type,
                        data: &image.data,
                    },
                    RequestPart::Text(prompt),
                ],
            }],
            generation_config: RequestGenerationConfig {
                response_mime_type: "application/json",
            },
        };

        let response = self
            .http
            .post(&url)
            .timeout(Duration::from_secs(self.timeout_secs))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ModelError::Timeout {
                        secs: self.timeout_secs,
                    }
                } else {
                    ModelError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            let detail = detail.chars().take(200).collect::<String>();
            return Err(ModelError::Api {
                status: status.as_u16(),
                detail,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Transport(format!("invalid response body: {e}")))?;

        let text: String = parsed
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(ModelError::EmptyResponse);
        }

        let usage = parsed
            .usage_metadata
            .map(|u| TokenUsage {
                total_tokens: u.total_token_count,
                input_tokens: u.prompt_token_count,
                output_tokens: u.candidates_token_count,
            })
            .unwrap_or_default();

        Ok(ModelReply { text, usage })
    }
}
