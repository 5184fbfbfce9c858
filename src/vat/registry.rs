//! Registry lookup orchestration: bounded, capped, tri-state.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::{MAX_REGISTRY_LOOKUPS, Validity, VatNumberCandidate, VatValidationResult};

/// A definitive answer from the registry for one `(country, digits)` pair.
#[derive(Debug, Clone)]
pub struct RegistryAnswer {
    pub valid: bool,
    pub company_name: Option<String>,
    pub company_address: Option<String>,
    pub request_date: Option<String>,
}

/// Why a lookup produced no definitive answer. Every variant maps to
/// [`Validity::Unknown`], never to `Invalid`.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum RegistryError {
    #[error("registry rate limit reached: {0}")]
    RateLimited(String),
    #[error("registry request timed out")]
    Timeout,
    #[error("registry returned HTTP {0}")]
    Status(u16),
    #[error("registry transport error: {0}")]
    Transport(String),
    #[error("registry response malformed: {0}")]
    Malformed(String),
}

/// External VAT registry, keyed by country code and national number part.
#[async_trait]
pub trait VatRegistry: Send + Sync {
    async fn check(&self, country: &str, digits: &str) -> Result<RegistryAnswer, RegistryError>;
}

/// Issue at most one lookup per forwarded candidate, hard-capped at
/// [`MAX_REGISTRY_LOOKUPS`] per document. Lookup failures become
/// `unknown` results; candidates without a country are unknown without
/// any call being made.
pub async fn validate_candidates(
    candidates: &[VatNumberCandidate],
    registry: &dyn VatRegistry,
) -> Vec<VatValidationResult> {
    let mut results = Vec::new();

    for candidate in candidates.iter().take(MAX_REGISTRY_LOOKUPS) {
        let Some(country) = candidate.country_code.as_deref() else {
            results.push(unknown_result(candidate, "country could not be determined"));
            continue;
        };

        debug!(vat = %candidate.display_number(), "registry lookup");
        match registry.check(country, &candidate.digits).await {
            Ok(answer) => {
                let valid = if answer.valid {
                    Validity::Valid
                } else {
                    Validity::Invalid
                };
                results.push(VatValidationResult {
                    vat_number: candidate.display_number(),
                    country_code: Some(country.to_string()),
                    valid,
                    company_name: answer.company_name,
                    company_address: answer.company_address,
                    validated_at: answer.request_date,
                    error_reason: None,
                });
            }
            Err(err) => {
                warn!(vat = %candidate.display_number(), error = %err, "registry lookup failed");
                results.push(unknown_result(candidate, &err.to_string()));
            }
        }
    }

    results
}

/// Mark every forwarded candidate `unknown` without issuing any call.
/// Used when no registry is configured.
pub fn unvalidated_results(candidates: &[VatNumberCandidate]) -> Vec<VatValidationResult> {
    candidates
        .iter()
        .take(MAX_REGISTRY_LOOKUPS)
        .map(|c| unknown_result(c, "registry validation not performed"))
        .collect()
}

fn unknown_result(candidate: &VatNumberCandidate, reason: &str) -> VatValidationResult {
    VatValidationResult {
        vat_number: candidate.display_number(),
        country_code: candidate.country_code.clone(),
        valid: Validity::Unknown,
        company_name: None,
        company_address: None,
        validated_at: None,
        error_reason: Some(reason.to_string()),
    }
}
