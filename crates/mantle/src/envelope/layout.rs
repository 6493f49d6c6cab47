//! Binary and textual layout of an envelope.
//!
//! ```text
//! bytes = ciphertext+tag ‖ nonce (12) ‖ wrapped DEK (wrapped_dek_len)
//! text  = base64(bytes), newline every `line_width` characters
//! ```
//!
//! The ciphertext length varies with the plaintext, so segments are located
//! from the end of the buffer.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use mantle_common::EnvelopeError;

use crate::crypto::NONCE_LEN;

/// Default column at which encoded envelopes are wrapped.
pub const DEFAULT_LINE_WIDTH: usize = 40;

/// Borrowed view of the three segments of a decoded envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segments<'a> {
    /// Payload ciphertext with its authentication tag.
    pub ciphertext: &'a [u8],
    /// Payload nonce, stored in clear.
    pub nonce: &'a [u8],
    /// DEK as returned by the KMS wrap.
    pub wrapped_dek: &'a [u8],
}

/// Concatenate the segments into the envelope byte layout.
pub fn assemble(ciphertext: &[u8], nonce: &[u8], wrapped_dek: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(ciphertext.len() + nonce.len() + wrapped_dek.len());
    out.extend_from_slice(ciphertext);
    out.extend_from_slice(nonce);
    out.extend_from_slice(wrapped_dek);
    out
}

/// Split decoded envelope bytes from the tail backward.
///
/// # Errors
///
/// Returns [`EnvelopeError::MalformedEnvelope`] if `bytes` is shorter than
/// `NONCE_LEN + wrapped_dek_len`.
pub fn split(bytes: &[u8], wrapped_dek_len: usize) -> Result<Segments<'_>, EnvelopeError> {
    let min = NONCE_LEN + wrapped_dek_len;
    if bytes.len() < min {
        return Err(EnvelopeError::MalformedEnvelope {
            len: bytes.len(),
            min,
        });
    }
    let (rest, wrapped_dek) = bytes.split_at(bytes.len() - wrapped_dek_len);
    let (ciphertext, nonce) = rest.split_at(rest.len() - NONCE_LEN);
    Ok(Segments {
        ciphertext,
        nonce,
        wrapped_dek,
    })
}

/// Base64-encode `bytes`, inserting a newline every `line_width` characters.
///
/// `None` or `Some(0)` produces a single line.
pub fn encode_text(bytes: &[u8], line_width: Option<usize>) -> String {
    let encoded = STANDARD.encode(bytes);
    match line_width {
        Some(width) if width > 0 => insert_newlines(&encoded, width),
        _ => encoded,
    }
}

/// Decode envelope text, ignoring all whitespace.
///
/// # Errors
///
/// Returns [`EnvelopeError::DecodeFailure`] on invalid base64.
pub fn decode_text(text: &str) -> Result<Vec<u8>, EnvelopeError> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| EnvelopeError::DecodeFailure(e.to_string()))
}

fn insert_newlines(encoded: &str, width: usize) -> String {
    // Base64 output is ASCII, so byte offsets are char boundaries.
    let mut out = String::with_capacity(encoded.len() + encoded.len() / width);
    for (i, chunk) in encoded.as_bytes().chunks(width).enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(std::str::from_utf8(chunk).unwrap_or_default());
    }
    out
}
