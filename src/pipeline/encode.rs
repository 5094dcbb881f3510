//! Image encoding: raw bytes → base64 payload for the model API.
//!
//! Gemini-style vision APIs accept images as base64 `inline_data` parts in
//! the JSON request body. The payload keeps the mime type alongside the
//! encoded data because the API rejects mismatched declarations.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

/// A base64-encoded image ready for the multimodal request body.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    /// Base64 of the raw image bytes (standard alphabet, padded).
    pub data: String,
    /// Declared mime type, e.g. "image/png".
    pub mime_type: String,
}

/// Wrap image bytes as an [`ImagePayload`].
///
/// The mime type is sniffed from magic bytes rather than trusted from the
/// URL extension; preprocessed images are always PNG, but the raw fallback
/// path can carry whatever the client uploaded.
pub fn encode_image(bytes: &[u8]) -> ImagePayload {
    let mime_type = sniff_mime(bytes).to_string();
    let data = STANDARD.encode(bytes);
    debug!("Encoded image → {} bytes base64 ({})", data.len(), mime_type);
    ImagePayload { data, mime_type }
}

/// Detect the image format from magic bytes. Defaults to PNG, which the
/// Gemini API treats as a lenient hint rather than a hard contract.
fn sniff_mime(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        "image/png"
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if bytes.starts_with(b"GIF8") {
        "image/gif"
    } else if bytes.len() > 11 && &bytes[8..12] == b"WEBP" {
        "image/webp"
    } else {
        "image/png"
    }
}
