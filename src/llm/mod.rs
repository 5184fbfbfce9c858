//! Optional LLM-assisted extraction: context budgeting, a probing client,
//! and tolerant response parsing. Every failure here degrades silently to
//! the rule-based path.

use async_trait::async_trait;
use thiserror::Error;

pub mod budget;
#[cfg(feature = "llm")]
pub mod client;
pub mod parse;

pub use budget::{ELISION_MARKER, budget_transcript};
#[cfg(feature = "llm")]
pub use client::HttpInferenceClient;
pub use parse::{LlmExtraction, parse_extraction};

/// Instruction template sent as the system message.
pub const SYSTEM_PROMPT: &str = "You extract structured data from receipt and invoice text. \
Respond with a single JSON object with these keys: vendor_name, description, total_amount, \
net_amount, vat_amount, vat_rate, date (YYYY-MM-DD), reverse_charge (boolean), currency. \
Use null for anything you cannot determine. Amounts are plain numbers without currency symbols.";

/// Why no usable inference output was produced.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum LlmError {
    #[error("inference endpoint unavailable: {0}")]
    Unavailable(String),
    #[error("inference request timed out")]
    Timeout,
    #[error("inference endpoint returned HTTP {0}")]
    Status(u16),
    #[error("inference response malformed: {0}")]
    Malformed(String),
}

/// An inference backend producing chat-completion text.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError>;
}

/// Build the user message around the (budgeted) transcript.
pub fn user_prompt(transcript: &str) -> String {
    format!("Receipt text:\n\n{transcript}\n\nJSON:")
}
