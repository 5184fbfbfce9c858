//! Relevance scoring and capping of VAT-number candidates.
//!
//! The registry is rate-limited; this filter is the construction-time
//! enforcement of the lookup cap. At most [`MAX_REGISTRY_LOOKUPS`]
//! candidates ever leave this module.

use std::collections::HashSet;

use crate::core::{ExtractionConfig, MAX_REGISTRY_LOOKUPS, VatNumberCandidate};
use crate::vat::number::expected_digit_len;

/// Relevance weights, one testable constant each.
pub const W_EXPLICIT_LABEL: i32 = 50;
pub const W_TAX_KEYWORD: i32 = 30;
pub const W_DOMESTIC: i32 = 20;
pub const W_LENGTH_MATCH: i32 = 15;
pub const P_STRUCTURAL_DUP: i32 = -10;
/// Candidates below this score are never forwarded.
pub const MIN_RELEVANCE: i32 = 20;

/// Explicit VAT/tax-ID labels, matched lowercase against the line context.
const EXPLICIT_LABELS: &[&str] = &[
    "btw-nummer",
    "btw nummer",
    "btw-nr",
    "btw nr",
    "btw-id",
    "vat number",
    "vat no",
    "vat nr",
    "vat reg",
    "ust-id",
    "ust.id",
    "tax id",
];

/// Weaker generic tax keywords.
const TAX_KEYWORDS: &[&str] = &["btw", "vat", "tax", "belasting", "ust"];

/// Score one candidate against its line context and the rest of the set.
pub fn relevance_score(
    candidate: &VatNumberCandidate,
    all: &[VatNumberCandidate],
    config: &ExtractionConfig,
) -> i32 {
    let context = candidate.line_context.to_lowercase();
    let mut score = 0;

    if EXPLICIT_LABELS.iter().any(|l| context.contains(l)) {
        score += W_EXPLICIT_LABEL;
    } else if TAX_KEYWORDS.iter().any(|k| context.contains(k)) {
        score += W_TAX_KEYWORD;
    }

    if let Some(cc) = &candidate.country_code {
        if cc == &config.domestic_country {
            score += W_DOMESTIC;
        }
        if expected_digit_len(cc) == Some(candidate.digits.chars().count()) {
            score += W_LENGTH_MATCH;
        }
    }

    let structural_dups = all
        .iter()
        .filter(|o| {
            o.digits == candidate.digits
                && !(o.country_code == candidate.country_code && o.line_number == candidate.line_number)
        })
        .count();
    score + P_STRUCTURAL_DUP * structural_dups as i32
}

/// Score, filter, rank, and cap the candidate set.
///
/// Survivors carry their score, are sorted descending (ties keep extraction
/// order), deduplicated by full VAT string keeping the best, and truncated
/// to the registry lookup cap.
pub fn filter_candidates(
    candidates: Vec<VatNumberCandidate>,
    config: &ExtractionConfig,
) -> Vec<VatNumberCandidate> {
    let scored: Vec<VatNumberCandidate> = candidates
        .iter()
        .map(|c| {
            let mut c = c.clone();
            c.relevance_score = relevance_score(&c, &candidates, config);
            c
        })
        .filter(|c| c.relevance_score >= MIN_RELEVANCE)
        .collect();

    let mut ranked = scored;
    ranked.sort_by_key(|c| -c.relevance_score);

    let mut seen = HashSet::new();
    ranked.retain(|c| seen.insert(c.display_number()));
    ranked.truncate(MAX_REGISTRY_LOOKUPS);
    ranked
}
