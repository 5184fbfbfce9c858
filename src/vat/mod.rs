//! VAT identifier discovery, relevance filtering, registry validation, and
//! the treatment decision tree.
//!
//! The flow is strictly staged: [`number::extract_vat_numbers`] finds
//! candidates, [`relevance::filter_candidates`] caps them,
//! [`registry::validate_candidates`] turns them into tri-state evidence,
//! and [`treatment::decide_treatment`] is the only place that evidence
//! becomes a decision.

pub mod number;
pub mod registry;
pub mod relevance;
pub mod treatment;
#[cfg(feature = "vies")]
pub mod vies;

pub use number::{expected_digit_len, extract_vat_numbers};
pub use registry::{
    RegistryAnswer, RegistryError, VatRegistry, unvalidated_results, validate_candidates,
};
pub use relevance::{filter_candidates, relevance_score};
pub use treatment::{REVERSE_CHARGE_RATE, decide_treatment, reverse_charge_phrase_present};
#[cfg(feature = "vies")]
pub use vies::ViesClient;
