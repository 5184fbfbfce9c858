//! VAT-number discovery: per-country shapes first, generic fallbacks after.

use lazy_static::lazy_static;
use regex::Regex;

use crate::core::{
    TextLine, VatExtractionMethod, VatNumberCandidate, country_from_keywords, is_eu,
};

/// Minimum normalized length for a VAT-number-shaped token.
const MIN_VAT_LEN: usize = 8;

/// Fixed-shape patterns per EU state. The expected digit length feeds the
/// relevance filter.
pub struct CountryVatShape {
    pub country: &'static str,
    pub pattern: Regex,
    pub expected_len: usize,
}

lazy_static! {
    pub static ref COUNTRY_VAT_SHAPES: Vec<CountryVatShape> = vec![
        shape("NL", r"\bNL\s?(\d{9}\s?B\s?\d{2})\b", 12),
        shape("DE", r"\bDE\s?(\d{9})\b", 9),
        shape("BE", r"\bBE\s?(0\d{9})\b", 10),
        shape("FR", r"\bFR\s?([A-Z0-9]{2}\s?\d{9})\b", 11),
        shape("IT", r"\bIT\s?(\d{11})\b", 11),
        shape("ES", r"\bES\s?([A-Z0-9]\d{7}[A-Z0-9])\b", 9),
        shape("AT", r"\bAT\s?(U\d{8})\b", 9),
        shape("PL", r"\bPL\s?(\d{10})\b", 10),
        shape("SE", r"\bSE\s?(\d{12})\b", 12),
        shape("DK", r"\bDK\s?(\d{8})\b", 8),
        shape("LU", r"\bLU\s?(\d{8})\b", 8),
        shape("PT", r"\bPT\s?(\d{9})\b", 9),
        shape("FI", r"\bFI\s?(\d{8})\b", 8),
        shape("IE", r"\bIE\s?(\d[A-Z0-9]\d{5}[A-Z]{1,2})\b", 8),
    ];

    /// Generic EU-shaped token: explicit 2-letter prefix plus 8-12 chars.
    static ref GENERIC_PREFIXED: Regex =
        Regex::new(r"\b([A-Z]{2})\s?([0-9][0-9A-Z]{7,11})\b").unwrap();

    /// Label-anchored fallback: a VAT/tax-ID label followed by the number.
    static ref LABEL_ANCHORED: Regex = Regex::new(
        r"(?i)(?:btw[-\s]?(?:nummer|nr|id)|vat\s*(?:number|nr|no|reg)|ust[-.\s]?id(?:nr)?|tax\s*id)\s*\.?:?\s*([A-Za-z0-9][A-Za-z0-9 .\-]{6,24})"
    ).unwrap();
}

fn shape(country: &'static str, pattern: &str, expected_len: usize) -> CountryVatShape {
    CountryVatShape {
        country,
        pattern: Regex::new(pattern).unwrap_or_else(|e| panic!("bad VAT shape {country}: {e}")),
        expected_len,
    }
}

/// Expected normalized length of the national part, when the country has a
/// fixed-shape entry.
pub fn expected_digit_len(country: &str) -> Option<usize> {
    COUNTRY_VAT_SHAPES
        .iter()
        .find(|s| s.country == country)
        .map(|s| s.expected_len)
}

/// Scan every transcript line for VAT-number-shaped tokens.
///
/// Per-country shapes run first; generic prefixed and label-anchored
/// fallbacks after. A generic match without a usable prefix gets its country
/// inferred from country-name keywords within two lines; failing that, the
/// candidate is kept with no country. Duplicates by `(country, digits)`
/// collapse to the first occurrence.
pub fn extract_vat_numbers(lines: &[TextLine]) -> Vec<VatNumberCandidate> {
    let mut found: Vec<VatNumberCandidate> = Vec::new();

    for line in lines {
        let upper = line.content.to_uppercase();

        for shape in COUNTRY_VAT_SHAPES.iter() {
            for caps in shape.pattern.captures_iter(&upper) {
                push_candidate(
                    &mut found,
                    Some(shape.country.to_string()),
                    normalize(&caps[1]),
                    line,
                    VatExtractionMethod::CountryPattern,
                );
            }
        }

        for caps in GENERIC_PREFIXED.captures_iter(&upper) {
            let prefix = &caps[1];
            if !is_eu(prefix) {
                continue;
            }
            push_candidate(
                &mut found,
                Some(prefix.to_string()),
                normalize(&caps[2]),
                line,
                VatExtractionMethod::GenericPattern,
            );
        }

        for caps in LABEL_ANCHORED.captures_iter(&line.content) {
            let raw = normalize(&caps[1]);
            let (country, digits) = split_prefix(&raw)
                .map(|(cc, rest)| (Some(cc.to_string()), rest.to_string()))
                .unwrap_or_else(|| (infer_country(lines, line.index), raw.clone()));
            push_candidate(
                &mut found,
                country,
                digits,
                line,
                VatExtractionMethod::GenericPattern,
            );
        }
    }

    found
}

fn push_candidate(
    found: &mut Vec<VatNumberCandidate>,
    country_code: Option<String>,
    digits: String,
    line: &TextLine,
    method: VatExtractionMethod,
) {
    if digits.chars().count() < MIN_VAT_LEN {
        return;
    }
    if found
        .iter()
        .any(|c| c.country_code == country_code && c.digits == digits)
    {
        return;
    }
    found.push(VatNumberCandidate {
        country_code,
        digits,
        line_context: line.content.clone(),
        line_number: line.index,
        extraction_method: method,
        relevance_score: 0,
    });
}

/// Uppercase and strip everything non-alphanumeric.
fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

// A normalized token starting with a known EU prefix splits into
// (country, national part).
fn split_prefix(normalized: &str) -> Option<(&str, &str)> {
    let (head, rest) = normalized.split_at_checked(2)?;
    if head.chars().all(|c| c.is_ascii_alphabetic()) && is_eu(head) && rest.len() >= MIN_VAT_LEN {
        Some((head, rest))
    } else {
        None
    }
}

// Country-name keywords within two lines of the match.
fn infer_country(lines: &[TextLine], index: usize) -> Option<String> {
    let start = index.saturating_sub(2);
    let end = (index + 2).min(lines.len().saturating_sub(1));
    lines
        .get(start..=end)?
        .iter()
        .find_map(|l| country_from_keywords(&l.content).map(str::to_string))
}
