//! Vendor name extraction — an ordered cascade where the first hit wins.

use crate::core::{DerivationStage, FieldCandidate, TextLine};
use crate::extract::first_success;
use crate::extract::patterns::{
    AMOUNT_LIKE, DATE_LIKE, INVOICE_INDICATORS, INVOICE_LABEL, KNOWN_VENDORS, LEGAL_ENTITY,
    PAGE_MARKER, TIME_LIKE, TITLE_CASE_MULTI, VENDOR_BOILERPLATE, is_address_like,
    is_customer_info, is_purely_numeric,
};

/// Vendor-likelihood weights. Accepted at [`VENDOR_ACCEPT_SCORE`].
pub const W_LEGAL_ENTITY: i32 = 3;
pub const W_UPPERCASE: i32 = 2;
pub const W_TITLE_CASE: i32 = 2;
pub const W_NO_DIGITS: i32 = 1;
pub const W_GOOD_LENGTH: i32 = 1;
pub const VENDOR_ACCEPT_SCORE: i32 = 2;

const HEADER_WINDOW: usize = 8;
const SCAN_WINDOW: usize = 10;
const FALLBACK_WINDOW: usize = 5;

/// Extract the vendor name, or `None` when every stage misses.
pub fn extract_vendor(lines: &[TextLine]) -> Option<FieldCandidate> {
    let stages: &[fn(&[TextLine]) -> Option<FieldCandidate>] = &[
        legal_entity_header,
        uppercase_header,
        known_vendor,
        invoice_proximity,
        scored_scan,
        fallback_first_line,
    ];
    first_success(stages, lines)
}

/// Score a line's likelihood of being the vendor name.
///
/// Returns 0 outright for lines that look like a date, time, amount,
/// page marker, or invoice label.
pub fn vendor_score(line: &str) -> i32 {
    let trimmed = line.trim();
    if trimmed.is_empty() || looks_like_non_vendor(trimmed) {
        return 0;
    }

    let mut score = 0;
    if LEGAL_ENTITY.is_match(trimmed) {
        score += W_LEGAL_ENTITY;
    }
    if is_all_uppercase(trimmed) && trimmed.chars().count() > 3 {
        score += W_UPPERCASE;
    }
    if TITLE_CASE_MULTI.is_match(trimmed) {
        score += W_TITLE_CASE;
    }
    if !trimmed.chars().any(|c| c.is_ascii_digit()) {
        score += W_NO_DIGITS;
    }
    let len = trimmed.chars().count();
    if (3..=50).contains(&len) {
        score += W_GOOD_LENGTH;
    }
    score
}

fn looks_like_non_vendor(line: &str) -> bool {
    DATE_LIKE.is_match(line)
        || TIME_LIKE.is_match(line)
        || AMOUNT_LIKE.is_match(line)
        || PAGE_MARKER.is_match(line)
        || INVOICE_LABEL.is_match(line)
}

fn is_all_uppercase(line: &str) -> bool {
    let mut has_alpha = false;
    for c in line.chars() {
        if c.is_alphabetic() {
            has_alpha = true;
            if !c.is_uppercase() {
                return false;
            }
        }
    }
    has_alpha
}

// Stage 1: a legal-entity marker in the first lines is conclusive.
fn legal_entity_header(lines: &[TextLine]) -> Option<FieldCandidate> {
    lines
        .iter()
        .take(HEADER_WINDOW)
        .find(|l| LEGAL_ENTITY.is_match(&l.content))
        .map(|l| FieldCandidate::new(l.content.trim(), DerivationStage::LegalEntity))
}

// Stage 2: an all-uppercase header line that is not boilerplate.
fn uppercase_header(lines: &[TextLine]) -> Option<FieldCandidate> {
    lines.iter().take(HEADER_WINDOW).find_map(|l| {
        let trimmed = l.content.trim();
        let len = trimmed.chars().count();
        if !(4..=59).contains(&len) || !is_all_uppercase(trimmed) {
            return None;
        }
        let lower = trimmed.to_lowercase();
        if VENDOR_BOILERPLATE.iter().any(|w| lower.contains(w)) {
            return None;
        }
        Some(FieldCandidate::new(trimmed, DerivationStage::UppercaseHeader))
    })
}

// Stage 3: fixed table of known vendor-name patterns over the whole corpus.
fn known_vendor(lines: &[TextLine]) -> Option<FieldCandidate> {
    let corpus = lines
        .iter()
        .map(|l| l.content.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");
    KNOWN_VENDORS.iter().find_map(|re| {
        re.find(&corpus).map(|m| {
            FieldCandidate::new(title_case(m.as_str()), DerivationStage::KnownVendor)
        })
    })
}

// Stage 4: scored lines within ±3 of an invoice-indicator line.
fn invoice_proximity(lines: &[TextLine]) -> Option<FieldCandidate> {
    for (idx, line) in lines.iter().enumerate() {
        let lower = line.content.to_lowercase();
        if !INVOICE_INDICATORS.iter().any(|w| lower.contains(w)) {
            continue;
        }
        let start = idx.saturating_sub(3);
        let end = (idx + 3).min(lines.len().saturating_sub(1));
        // Skip by slice position, not by the TextLine index field: callers
        // may number lines with an offset.
        for (nidx, neighbor) in lines.iter().enumerate().take(end + 1).skip(start) {
            if nidx == idx {
                continue;
            }
            if vendor_score(&neighbor.content) >= VENDOR_ACCEPT_SCORE {
                return Some(FieldCandidate::new(
                    neighbor.content.trim(),
                    DerivationStage::InvoiceProximity,
                ));
            }
        }
    }
    None
}

// Stage 5: scored scan of the document head, skipping customer information
// (direct keyword or keyword within one line).
fn scored_scan(lines: &[TextLine]) -> Option<FieldCandidate> {
    for (idx, line) in lines.iter().take(SCAN_WINDOW).enumerate() {
        if is_customer_info(&line.content) || near_customer_info(lines, idx) {
            continue;
        }
        if vendor_score(&line.content) >= VENDOR_ACCEPT_SCORE {
            return Some(FieldCandidate::new(
                line.content.trim(),
                DerivationStage::ScoredScan,
            ));
        }
    }
    None
}

fn near_customer_info(lines: &[TextLine], idx: usize) -> bool {
    let start = idx.saturating_sub(1);
    let end = (idx + 1).min(lines.len().saturating_sub(1));
    lines[start..=end].iter().any(|l| is_customer_info(&l.content))
}

// Stage 6: first plausible non-empty line near the top.
fn fallback_first_line(lines: &[TextLine]) -> Option<FieldCandidate> {
    lines.iter().take(FALLBACK_WINDOW).find_map(|l| {
        let trimmed = l.content.trim();
        if trimmed.is_empty()
            || is_address_like(trimmed)
            || is_customer_info(trimmed)
            || is_purely_numeric(trimmed)
        {
            return None;
        }
        Some(FieldCandidate::new(trimmed, DerivationStage::Fallback))
    })
}

fn title_case(s: &str) -> String {
    s.replace('.', " ")
        .split_whitespace()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transcript_from_strings;

    #[test]
    fn legal_entity_wins_first() {
        let lines = transcript_from_strings(&["Jansen Consultancy B.V.", "Hoofdstraat 1"]);
        let v = extract_vendor(&lines).unwrap();
        assert_eq!(v.text, "Jansen Consultancy B.V.");
        assert_eq!(v.stage, DerivationStage::LegalEntity);
    }

    #[test]
    fn uppercase_header_detected() {
        let lines = transcript_from_strings(&["some noise", "COOLGEAR TRADING", "Hoofdstraat 1"]);
        let v = extract_vendor(&lines).unwrap();
        assert_eq!(v.text, "COOLGEAR TRADING");
        assert_eq!(v.stage, DerivationStage::UppercaseHeader);
    }

    #[test]
    fn uppercase_boilerplate_skipped() {
        let lines = transcript_from_strings(&["FACTUUR", "kruidvat filiaal 12"]);
        let v = extract_vendor(&lines).unwrap();
        assert_eq!(v.stage, DerivationStage::KnownVendor);
        assert_eq!(v.text, "Kruidvat");
    }

    #[test]
    fn known_vendor_title_cased() {
        let lines = transcript_from_strings(&["welkom bij albert heijn", "kassabon"]);
        let v = extract_vendor(&lines).unwrap();
        assert_eq!(v.text, "Albert Heijn");
    }

    #[test]
    fn scored_scan_skips_customer_block() {
        let lines = transcript_from_strings(&[
            "nota",
            "Klantnummer: 42",
            "Pietersen Webdiensten",
            "iets anders hier",
        ]);
        // "Pietersen Webdiensten" is adjacent to a customer keyword line and
        // must be skipped by the scored scan; proximity stage may still pick
        // a clean line further away.
        let v = extract_vendor(&lines);
        assert!(v.is_none_or(|c| c.text != "Klantnummer: 42"));
    }

    #[test]
    fn fallback_skips_addresses_and_numbers() {
        // "snackbar 24" contains a digit, so it scores below the accept
        // threshold and only the fallback stage picks it up.
        let lines = transcript_from_strings(&["1234 AB Amsterdam", "12345", "snackbar 24"]);
        let v = extract_vendor(&lines).unwrap();
        assert_eq!(v.stage, DerivationStage::Fallback);
        assert_eq!(v.text, "snackbar 24");
    }

    #[test]
    fn no_lines_no_vendor() {
        assert!(extract_vendor(&[]).is_none());
    }

    #[test]
    fn proximity_skips_indicator_line_under_offset_numbering() {
        // The indicator line itself scores high enough to be accepted, and
        // its TextLine index does not match its slice position. The
        // proximity stage must still skip it; the scored scan picks it up.
        let lines = vec![TextLine::new("Betreft: factuur", 1.0, 5)];
        let v = extract_vendor(&lines).unwrap();
        assert_eq!(v.stage, DerivationStage::ScoredScan);
    }

    #[test]
    fn score_weights_add_up() {
        // Legal entity + no digits + good length
        assert_eq!(
            vendor_score("Jansen Beheer B.V."),
            W_LEGAL_ENTITY + W_NO_DIGITS + W_GOOD_LENGTH
        );
        // Uppercase + no digits + good length
        assert_eq!(
            vendor_score("COOLGEAR"),
            W_UPPERCASE + W_NO_DIGITS + W_GOOD_LENGTH
        );
        // Title case multi-word + no digits + good length
        assert_eq!(
            vendor_score("Jansen Advies Groep"),
            W_TITLE_CASE + W_NO_DIGITS + W_GOOD_LENGTH
        );
    }

    #[test]
    fn score_rejects_dates_amounts_and_labels() {
        assert_eq!(vendor_score("15-01-2024"), 0);
        assert_eq!(vendor_score("12:30"), 0);
        assert_eq!(vendor_score("€ 12,50"), 0);
        assert_eq!(vendor_score("Pagina 1"), 0);
        assert_eq!(vendor_score("Factuur 2024-001"), 0);
    }
}
