//! Description extraction — collect candidates broadly, select narrowly.

use crate::core::{DerivationStage, FieldCandidate, TextLine};
use crate::extract::patterns::{
    AMOUNT_LIKE, DATE_LIKE, DESCRIPTION_INDICATORS, DESCRIPTION_MAX_LEN, DISCLAIMER_KEYWORDS,
    ITEM_PREFIX, PERIOD_MONTH_YEAR, QUANTITY_SHAPE, SERVICE_KEYWORDS, TELECOM_KEYWORDS,
    TRAILING_AMOUNT, is_address_like, is_customer_info, is_purely_numeric,
};

const INDICATOR_WINDOW: usize = 3;

/// Extract the best line-item description, truncated to
/// [`DESCRIPTION_MAX_LEN`] characters.
pub fn extract_description(lines: &[TextLine]) -> Option<FieldCandidate> {
    let candidates = collect_candidates(lines);
    select(candidates).map(|mut c| {
        c.text = truncate_chars(&c.text, DESCRIPTION_MAX_LEN);
        c
    })
}

fn collect_candidates(lines: &[TextLine]) -> Vec<FieldCandidate> {
    let mut candidates = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        let trimmed = line.content.trim();
        if trimmed.is_empty() {
            continue;
        }
        let lower = trimmed.to_lowercase();

        if SERVICE_KEYWORDS.iter().any(|k| lower.contains(k)) {
            candidates.push(FieldCandidate::new(
                strip_item_decoration(trimmed),
                DerivationStage::ServiceKeyword,
            ));
        }

        if DESCRIPTION_INDICATORS.iter().any(|k| lower.contains(k)) {
            for follower in lines.iter().skip(idx + 1).take(INDICATOR_WINDOW) {
                let text = follower.content.trim();
                if usable_follower(text) {
                    candidates.push(FieldCandidate::new(
                        strip_item_decoration(text),
                        DerivationStage::IndicatorWindow,
                    ));
                    break;
                }
            }
        }

        if TELECOM_KEYWORDS.iter().any(|k| lower.contains(k)) {
            candidates.push(FieldCandidate::new(
                strip_item_decoration(trimmed),
                DerivationStage::DomainPhrase,
            ));
        }

        if (QUANTITY_SHAPE.is_match(trimmed) || PERIOD_MONTH_YEAR.is_match(trimmed))
            && !is_address_like(trimmed)
            && !is_customer_info(trimmed)
        {
            candidates.push(FieldCandidate::new(
                strip_item_decoration(trimmed),
                DerivationStage::QuantityShape,
            ));
        }
    }

    candidates
}

fn usable_follower(text: &str) -> bool {
    !text.is_empty()
        && !AMOUNT_LIKE.is_match(text)
        && !DATE_LIKE.is_match(text)
        && !is_purely_numeric(text)
        && !contains_disclaimer(text)
}

// Keyworded candidates win; disclaimers are excluded; more keyword hits
// outrank fewer, shorter text breaks ties.
fn select(candidates: Vec<FieldCandidate>) -> Option<FieldCandidate> {
    let keyworded: Vec<&FieldCandidate> = candidates
        .iter()
        .filter(|c| keyword_hits(&c.text) > 0 && !contains_disclaimer(&c.text))
        .collect();
    if let Some(best) = keyworded.iter().min_by(|a, b| {
        keyword_hits(&b.text)
            .cmp(&keyword_hits(&a.text))
            .then(a.text.chars().count().cmp(&b.text.chars().count()))
    }) {
        return Some((*best).clone());
    }

    let clean: Vec<&FieldCandidate> = candidates
        .iter()
        .filter(|c| !is_address_like(&c.text) && !contains_disclaimer(&c.text))
        .collect();
    if let Some(best) = clean.iter().max_by_key(|c| c.text.chars().count()) {
        return Some((*best).clone());
    }

    candidates
        .into_iter()
        .max_by_key(|c| c.text.chars().count())
}

fn keyword_hits(text: &str) -> usize {
    let lower = text.to_lowercase();
    SERVICE_KEYWORDS.iter().filter(|k| lower.contains(*k)).count()
}

fn contains_disclaimer(text: &str) -> bool {
    let lower = text.to_lowercase();
    DISCLAIMER_KEYWORDS.iter().any(|k| lower.contains(k))
}

fn strip_item_decoration(line: &str) -> String {
    let no_prefix = ITEM_PREFIX.replace(line, "");
    TRAILING_AMOUNT.replace(&no_prefix, "").trim().to_string()
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}
