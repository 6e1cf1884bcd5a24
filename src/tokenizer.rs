//! Token counting using tiktoken-rs
//!
//! The scanner only depends on the [`TokenEncoder`] trait; [`TiktokenEncoder`]
//! is the production implementation over OpenAI-compatible BPE encodings.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tiktoken_rs::tokenizer::Tokenizer;
use tiktoken_rs::CoreBPE;

/// Turns text into tokenizer unit ids. Implementations must be safe to call
/// from many worker threads at once.
pub trait TokenEncoder: Send + Sync {
    fn encode(&self, text: &str) -> Result<Vec<u32>>;

    /// Number of units `text` encodes to.
    fn count(&self, text: &str) -> Result<usize> {
        Ok(self.encode(text)?.len())
    }

    fn name(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum Encoding {
    #[default]
    #[serde(rename = "o200k_base")]
    #[value(name = "o200k_base")]
    O200kBase,
    #[serde(rename = "cl100k_base")]
    #[value(name = "cl100k_base")]
    Cl100kBase,
    #[serde(rename = "p50k_base")]
    #[value(name = "p50k_base")]
    P50kBase,
    #[serde(rename = "r50k_base")]
    #[value(name = "r50k_base")]
    R50kBase,
}

impl Encoding {
    pub const ALL: [Encoding; 4] = [
        Encoding::O200kBase,
        Encoding::Cl100kBase,
        Encoding::P50kBase,
        Encoding::R50kBase,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::O200kBase => "o200k_base",
            Encoding::Cl100kBase => "cl100k_base",
            Encoding::P50kBase => "p50k_base",
            Encoding::R50kBase => "r50k_base",
        }
    }

    fn tokenizer(&self) -> Tokenizer {
        match self {
            Encoding::O200kBase => Tokenizer::O200kBase,
            Encoding::Cl100kBase => Tokenizer::Cl100kBase,
            Encoding::P50kBase => Tokenizer::P50kBase,
            Encoding::R50kBase => Tokenizer::R50kBase,
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Encoding {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Encoding::ALL
            .into_iter()
            .find(|e| e.as_str() == wanted)
            .ok_or_else(|| {
                anyhow!(
                    "Unknown encoding '{}'. Supported: o200k_base, cl100k_base, p50k_base, r50k_base",
                    s
                )
            })
    }
}

/// Token encoder backed by a tiktoken BPE table
pub struct TiktokenEncoder {
    bpe: CoreBPE,
    encoding: Encoding,
}

impl TiktokenEncoder {
    pub fn new(encoding: Encoding) -> Result<Self> {
        let bpe = tiktoken_rs::get_bpe_from_tokenizer(encoding.tokenizer())
            .map_err(|e| anyhow!("Failed to load BPE for encoding '{}': {}", encoding, e))?;
        Ok(Self { bpe, encoding })
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }
}

impl TokenEncoder for TiktokenEncoder {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        Ok(self.bpe.encode_with_special_tokens(text))
    }

    fn name(&self) -> &str {
        self.encoding.as_str()
    }
}
