//! # bonnetje
//!
//! Turns a noisy OCR transcript of a receipt or invoice into a structured
//! fiscal record: vendor, date, description, amounts, VAT rate, and the
//! authoritative VAT treatment (domestic standard rate vs. cross-border
//! reverse charge), with a reviewer-facing confidence flag.
//!
//! All monetary values use [`rust_decimal::Decimal`] — never floating point.
//! The OCR engine itself is an external collaborator: everything here
//! consumes an ordered list of text lines with per-line confidence.
//!
//! ## Quick Start
//!
//! ```rust
//! use bonnetje::core::*;
//! use bonnetje::extract::{extract_amounts, extract_vendor};
//! use rust_decimal_macros::dec;
//!
//! let lines = transcript_from_strings(&["Jansen Consultancy B.V.", "TOTAAL € 121,00"]);
//! let config = ExtractionConfig::default();
//!
//! let amounts = extract_amounts(&lines, &config);
//! assert_eq!(amounts.total_amount, Some(dec!(121.00)));
//! assert_eq!(amounts.vat_amount, Some(dec!(21.00)));
//!
//! let vendor = extract_vendor(&lines).unwrap();
//! assert_eq!(vendor.text, "Jansen Consultancy B.V.");
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `extract` (default) | Field extractors, VAT discovery, decision tree, pipeline |
//! | `vies` (default) | VIES registry client for VAT number validation |
//! | `llm` (default) | HTTP inference client for LLM-assisted extraction |
//! | `cli` | The `bonnetje` command-line binary |
//! | `all` | Everything |

pub mod core;

#[cfg(feature = "extract")]
pub mod extract;

#[cfg(feature = "extract")]
pub mod llm;

#[cfg(feature = "extract")]
pub mod pipeline;

#[cfg(feature = "extract")]
pub mod vat;

// Re-export core types at crate root for convenience
pub use crate::core::*;

#[cfg(feature = "extract")]
pub use crate::pipeline::{DocumentRecord, ExtractionMethod, process_transcript};
