//! Amount extraction — total, VAT, and net, with rate determination.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use std::str::FromStr;

use crate::core::{AmountCandidate, ExtractionConfig, TextLine};
use crate::extract::patterns::{AMOUNT_CASCADE, VAT_AMOUNT_PATTERNS};

/// Pattern-cascade candidates below this value keep scanning: line-item
/// sub-prices are common false positives. A documented heuristic about
/// minimum plausible receipt totals, preserved exactly.
pub const ACCEPT_THRESHOLD: Decimal = dec!(10.0);

/// Monetary fields extracted from one transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedAmounts {
    pub total_amount: Option<Decimal>,
    pub vat_amount: Option<Decimal>,
    pub net_amount: Option<Decimal>,
    /// Determined rate as a fraction; defaults to the configured standard
    /// rate when the amounts give no better answer.
    pub vat_rate: Decimal,
    /// The winning total candidate, for traceability.
    pub total_candidate: Option<AmountCandidate>,
}

/// Run the amount cascade over the transcript and reconcile the results.
pub fn extract_amounts(lines: &[TextLine], config: &ExtractionConfig) -> ExtractedAmounts {
    let corpus = lowercased_corpus(lines);

    let total_candidate = find_total(&corpus);
    let mut total_amount = total_candidate.as_ref().map(|c| c.value);
    let mut vat_amount = find_vat_amount(&corpus);
    let mut net_amount = None;

    if let (Some(total), Some(vat)) = (total_amount, vat_amount) {
        if vat <= total {
            net_amount = Some(total - vat);
        } else {
            // OCR misread; an impossible VAT amount is worse than none.
            vat_amount = None;
        }
    }

    if let (Some(total), None) = (total_amount, vat_amount) {
        // Back-compute assuming the default standard rate.
        let rate = config.default_vat_rate;
        let vat = (total * rate / (Decimal::ONE + rate))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        vat_amount = Some(vat);
        net_amount = Some(total - vat);
    }

    if total_amount.is_none() {
        if let (Some(net), Some(vat)) = (net_amount, vat_amount) {
            total_amount = Some(net + vat);
        }
    }

    let vat_rate = match (vat_amount, net_amount) {
        (Some(vat), Some(net)) if net > Decimal::ZERO => {
            closest_known_rate(vat / net, &config.known_vat_rates)
        }
        _ => config.default_vat_rate,
    };

    ExtractedAmounts {
        total_amount,
        vat_amount,
        net_amount,
        vat_rate,
        total_candidate,
    }
}

/// Snap a computed VAT ratio to the closest known rate.
pub fn closest_known_rate(ratio: Decimal, known: &[Decimal]) -> Decimal {
    known
        .iter()
        .copied()
        .min_by_key(|r| (*r - ratio).abs())
        .unwrap_or(ratio)
}

fn lowercased_corpus(lines: &[TextLine]) -> String {
    lines
        .iter()
        .map(|l| l.content.to_lowercase())
        .collect::<Vec<_>>()
        .join("\n")
}

// The last match under each pattern is authoritative unless a larger amount
// was already recorded; a candidate at or above the threshold is accepted
// immediately and the cascade stops.
fn find_total(corpus: &str) -> Option<AmountCandidate> {
    let mut best: Option<AmountCandidate> = None;
    for (priority, pattern) in AMOUNT_CASCADE.iter().enumerate() {
        if let Some(caps) = pattern.captures_iter(corpus).last() {
            let Some(value) = parse_amount(&caps[1]) else {
                continue;
            };
            let candidate = AmountCandidate {
                value,
                raw_match: caps[0].to_string(),
                pattern_priority: priority,
            };
            best = match best.take() {
                Some(prev) if prev.value >= candidate.value => Some(prev),
                _ => Some(candidate),
            };
            if best.as_ref().is_some_and(|b| b.value >= ACCEPT_THRESHOLD) {
                break;
            }
        }
    }
    best
}

fn find_vat_amount(corpus: &str) -> Option<Decimal> {
    VAT_AMOUNT_PATTERNS
        .iter()
        .find_map(|p| p.captures(corpus).and_then(|caps| parse_amount(&caps[1])))
}

/// Parse a European-formatted amount, normalizing the comma separator.
fn parse_amount(s: &str) -> Option<Decimal> {
    Decimal::from_str(&s.replace(',', ".")).ok()
}
