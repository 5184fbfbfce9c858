//! EU membership and country-name inference tables.
//!
//! Fixed configuration for the VAT identifier extractor and the treatment
//! decision tree. Immutable at runtime.

/// EU member state country codes (ISO 3166-1 alpha-2).
/// Sorted for binary search.
pub const EU_COUNTRIES: &[&str] = &[
    "AT", "BE", "BG", "CY", "CZ", "DE", "DK", "EE", "EL", "ES", "FI", "FR", "GR", "HR", "HU", "IE",
    "IT", "LT", "LU", "LV", "MT", "NL", "PL", "PT", "RO", "SE", "SI", "SK",
];

/// Check whether `code` is an EU member state code.
pub fn is_eu(code: &str) -> bool {
    EU_COUNTRIES
        .binary_search(&code.to_uppercase().as_str())
        .is_ok()
}

/// Country-name keywords used to infer the country of a VAT number that
/// carries no 2-letter prefix. Matched lowercase against the ±2-line
/// neighborhood of the candidate.
pub const COUNTRY_KEYWORDS: &[(&str, &str)] = &[
    ("nederland", "NL"),
    ("netherlands", "NL"),
    ("holland", "NL"),
    ("duitsland", "DE"),
    ("deutschland", "DE"),
    ("germany", "DE"),
    ("belgië", "BE"),
    ("belgie", "BE"),
    ("belgium", "BE"),
    ("belgique", "BE"),
    ("frankrijk", "FR"),
    ("france", "FR"),
    ("spanje", "ES"),
    ("spain", "ES"),
    ("españa", "ES"),
    ("italië", "IT"),
    ("italie", "IT"),
    ("italy", "IT"),
    ("italia", "IT"),
    ("polen", "PL"),
    ("poland", "PL"),
    ("polska", "PL"),
    ("oostenrijk", "AT"),
    ("austria", "AT"),
    ("österreich", "AT"),
    ("ierland", "IE"),
    ("ireland", "IE"),
    ("luxemburg", "LU"),
    ("luxembourg", "LU"),
    ("denemarken", "DK"),
    ("denmark", "DK"),
    ("zweden", "SE"),
    ("sweden", "SE"),
    ("finland", "FI"),
    ("portugal", "PT"),
];

/// Infer a country code from free text, first keyword hit wins.
pub fn country_from_keywords(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    COUNTRY_KEYWORDS
        .iter()
        .find(|(kw, _)| lower.contains(kw))
        .map(|&(_, cc)| cc)
}

/// Legal-entity suffixes hinting at a company's home country. A weak,
/// diagnostic-only signal.
const ENTITY_SUFFIX_COUNTRIES: &[(&[&str], &str)] = &[
    (&["gmbh", "ag", "kg", "ohg"], "DE"),
    (&["ltd", "limited", "plc", "llp"], "GB"),
    (&["sarl", "sas", "eurl"], "FR"),
    (&["inc", "corp", "llc"], "US"),
];

/// Guess a company's country from legal-entity suffixes in its name.
pub fn country_hint_from_name(name: &str) -> Option<&'static str> {
    let lower = name.to_lowercase();
    let tokens: Vec<&str> = lower
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();
    ENTITY_SUFFIX_COUNTRIES
        .iter()
        .find(|(suffixes, _)| suffixes.iter().any(|s| tokens.contains(s)))
        .map(|&(_, cc)| cc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eu_membership() {
        assert!(is_eu("NL"));
        assert!(is_eu("de"));
        assert!(is_eu("BE"));
        assert!(!is_eu("GB"));
        assert!(!is_eu("US"));
        assert!(!is_eu("XX"));
    }

    #[test]
    fn eu_list_is_sorted() {
        for w in EU_COUNTRIES.windows(2) {
            assert!(w[0] < w[1], "not sorted: {} >= {}", w[0], w[1]);
        }
    }

    #[test]
    fn keyword_inference() {
        assert_eq!(country_from_keywords("Musterstraße 1, Deutschland"), Some("DE"));
        assert_eq!(country_from_keywords("Bruxelles, Belgique"), Some("BE"));
        assert_eq!(country_from_keywords("somewhere else"), None);
    }

    #[test]
    fn keyword_inference_is_case_insensitive() {
        assert_eq!(country_from_keywords("NEDERLAND"), Some("NL"));
    }

    #[test]
    fn entity_suffix_hints() {
        assert_eq!(country_hint_from_name("Musterfirma GmbH"), Some("DE"));
        assert_eq!(country_hint_from_name("Widgets Ltd."), Some("GB"));
        assert_eq!(country_hint_from_name("Boulangerie SARL"), Some("FR"));
        assert_eq!(country_hint_from_name("Jansen B.V."), None);
        assert_eq!(country_hint_from_name("Bavaria"), None);
    }
}
