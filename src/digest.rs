//! Content digests used as token-cache keys.
//!
//! Files are decoded before hashing: invalid UTF-8 sequences are dropped and
//! line endings are normalized to `\n`. The digest is taken over that decoded
//! text, which is also exactly what gets handed to the encoder, so a cache hit
//! means "this exact text was already counted".

use serde::{Deserialize, Serialize};
use sha2::digest::Output;
use sha2::{Digest, Sha256};
use std::fmt;

/// SHA-256 of decoded file content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    /// Lowercase hex form, the representation stored on disk.
    pub fn to_hex(&self) -> String {
        format!("{:x}", Output::<Sha256>::from(self.0))
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() != 64 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let mut bytes = [0u8; 32];
        for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
            let pair = std::str::from_utf8(chunk).ok()?;
            bytes[i] = u8::from_str_radix(pair, 16).ok()?;
        }
        Some(Self(bytes))
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Digest already-decoded text.
pub fn digest(text: &str) -> ContentDigest {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    ContentDigest(hasher.finalize().into())
}

/// Decode raw file bytes the way the counter reads files: UTF-8 with invalid
/// sequences dropped, then `\r\n` and lone `\r` folded to `\n`.
pub fn decode_text(bytes: &[u8]) -> String {
    normalize_newlines(&decode_utf8_dropping_invalid(bytes))
}

fn decode_utf8_dropping_invalid(mut bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    loop {
        match std::str::from_utf8(bytes) {
            Ok(valid) => {
                out.push_str(valid);
                return out;
            }
            Err(err) => {
                let (valid, rest) = bytes.split_at(err.valid_up_to());
                // `valid_up_to` marks a valid prefix.
                out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                match err.error_len() {
                    Some(skip) => bytes = &rest[skip..],
                    // Truncated sequence at end of input.
                    None => return out,
                }
            }
        }
    }
}

fn normalize_newlines(text: &str) -> String {
    if !text.contains('\r') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\r' {
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
            out.push('\n');
        } else {
            out.push(c);
        }
    }
    out
}
