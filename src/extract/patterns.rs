//! Regex and keyword tables for rule-based field extraction.
//!
//! Fixed configuration: these tables are built once and never mutated at
//! runtime. Amount and date patterns expect the lowercased transcript.

use lazy_static::lazy_static;
use regex::Regex;

/// Month-name table, Dutch and English, full names and common abbreviations.
pub const MONTH_NAMES: &[(&str, u32)] = &[
    ("januari", 1),
    ("january", 1),
    ("jan", 1),
    ("februari", 2),
    ("february", 2),
    ("feb", 2),
    ("maart", 3),
    ("march", 3),
    ("mrt", 3),
    ("mar", 3),
    ("april", 4),
    ("apr", 4),
    ("mei", 5),
    ("may", 5),
    ("juni", 6),
    ("june", 6),
    ("jun", 6),
    ("juli", 7),
    ("july", 7),
    ("jul", 7),
    ("augustus", 8),
    ("august", 8),
    ("aug", 8),
    ("september", 9),
    ("sep", 9),
    ("oktober", 10),
    ("october", 10),
    ("okt", 10),
    ("oct", 10),
    ("november", 11),
    ("nov", 11),
    ("december", 12),
    ("dec", 12),
];

/// Look up a month name (lowercase) in the fixed table.
pub fn month_number(name: &str) -> Option<u32> {
    MONTH_NAMES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|&(_, m)| m)
}

/// Lines near these words are searched for the vendor name.
pub const INVOICE_INDICATORS: &[&str] = &["factuur", "invoice", "rekening", "nota"];

/// A line containing one of these is customer/recipient information,
/// never the vendor.
pub const CUSTOMER_KEYWORDS: &[&str] = &[
    "klantnummer",
    "klant",
    "customer",
    "debiteur",
    "t.a.v.",
    "bill to",
    "ship to",
    "afleveradres",
    "bezorgadres",
    "factuuradres",
];

/// Boilerplate words excluded from the uppercase-header vendor stage.
pub const VENDOR_BOILERPLATE: &[&str] = &[
    "factuur", "invoice", "totaal", "total", "btw", "vat", "receipt", "kassabon", "bon", "datum",
    "date", "pagina", "page", "subtotaal", "subtotal",
];

/// Street-name suffixes and address words (substring match, lowercase).
pub const ADDRESS_KEYWORDS: &[&str] = &[
    "straat", "laan", "weg ", "plein", "gracht", "postbus", "street", "avenue", " road",
];

/// Service/business keywords that mark likely description lines.
pub const SERVICE_KEYWORDS: &[&str] = &[
    "diensten",
    "dienst",
    "services",
    "service",
    "consultancy",
    "advies",
    "abonnement",
    "hosting",
    "licentie",
    "license",
    "onderhoud",
    "maintenance",
    "support",
    "training",
    "ontwikkeling",
    "development",
    "verhuur",
    "levering",
    "telefonie",
    "internet",
    "software",
];

/// Keywords announcing that a description follows on the next lines.
pub const DESCRIPTION_INDICATORS: &[&str] = &[
    "omschrijving",
    "beschrijving",
    "description",
    "specificatie",
    "betreft",
];

/// Telecom phrase table for the domain-specific description window.
pub const TELECOM_KEYWORDS: &[&str] =
    &["abonnement", "mobiel", "bellen", "sms", "databundel", "belbundel"];

/// Legal-disclaimer terms excluded from description candidates.
pub const DISCLAIMER_KEYWORDS: &[&str] = &[
    "algemene voorwaarden",
    "voorwaarden",
    "aansprakelijk",
    "terms and conditions",
    "liability",
    "betalingstermijn",
    "vervaldatum",
];

/// Maximum description length in the assembled record.
pub const DESCRIPTION_MAX_LEN: usize = 200;

lazy_static! {
    /// Total-amount cascade, most specific first. Group 1 is the amount.
    pub static ref AMOUNT_CASCADE: Vec<Regex> = vec![
        // Explicit "total to pay" phrasing with optional currency
        Regex::new(r"(?:totaalbedrag|totaal\s+te\s+betalen|te\s+betalen)\s*:?\s*(?:eur|€)?\s*(\d+[.,]\d{2})").unwrap(),
        // Localized total/subtotal labels
        Regex::new(r"(?:totaal|total|subtotaal|subtotal)\s*:?\s*(?:eur|€)?\s*(\d+[.,]\d{2})").unwrap(),
        // Generic currency-tagged numbers
        Regex::new(r"€\s*(\d+[.,]\d{2})").unwrap(),
        Regex::new(r"\beur\s*(\d+[.,]\d{2})").unwrap(),
    ];

    /// Percentage-labeled VAT amount patterns, first match wins.
    pub static ref VAT_AMOUNT_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"btw\s*21\s*%\s*:?\s*€?\s*(\d+[.,]\d{2})").unwrap(),
        Regex::new(r"btw\s*9\s*%\s*:?\s*€?\s*(\d+[.,]\d{2})").unwrap(),
        Regex::new(r"btw\s*6\s*%\s*:?\s*€?\s*(\d+[.,]\d{2})").unwrap(),
        Regex::new(r"vat\s*21\s*%\s*:?\s*€?\s*(\d+[.,]\d{2})").unwrap(),
        Regex::new(r"vat\s*9\s*%\s*:?\s*€?\s*(\d+[.,]\d{2})").unwrap(),
        Regex::new(r"vat\s*6\s*%\s*:?\s*€?\s*(\d+[.,]\d{2})").unwrap(),
    ];

    static ref MONTH_ALT: String = MONTH_NAMES
        .iter()
        .map(|(n, _)| *n)
        .collect::<Vec<_>>()
        .join("|");

    /// Date keyword immediately followed by a numeric D/M/Y token.
    pub static ref DATE_LABELED_NUMERIC: Regex = Regex::new(
        r"(?:factuurdatum|datum|date|dated|d\.d\.)\s*:?\s*(\d{1,4})[-/.](\d{1,2})[-/.](\d{1,4})"
    ).unwrap();

    /// Date keyword followed by a month-name date.
    pub static ref DATE_LABELED_MONTH: Regex = Regex::new(&format!(
        r"(?:factuurdatum|datum|date|dated)\s*:?\s*(\d{{1,2}})\s+({MONTH_ALT})\.?\s+(\d{{2,4}})",
        MONTH_ALT = *MONTH_ALT
    )).unwrap();

    /// Bare month-name date anywhere in the text.
    pub static ref DATE_BARE_MONTH: Regex = Regex::new(&format!(
        r"\b(\d{{1,2}})\s+({MONTH_ALT})\.?\s+(\d{{2,4}})\b",
        MONTH_ALT = *MONTH_ALT
    )).unwrap();

    /// Bare numeric date triplet.
    pub static ref DATE_BARE_NUMERIC: Regex =
        Regex::new(r"\b(\d{1,4})[-/.](\d{1,2})[-/.](\d{1,4})\b").unwrap();

    /// Month-name + year period (e.g. "januari 2024"), a description shape.
    pub static ref PERIOD_MONTH_YEAR: Regex = Regex::new(&format!(
        r"(?i)\b({MONTH_ALT})\s+\d{{4}}\b",
        MONTH_ALT = *MONTH_ALT
    )).unwrap();

    /// Legal-entity suffix marking a company name.
    pub static ref LEGAL_ENTITY: Regex = Regex::new(
        r"(?i)\b(?:b\.?v\.?|n\.?v\.?|gmbh|ltd|limited|plc|llc|inc|corp|sarl|sas|bvba|sprl|vof|holding|stichting)\b"
    ).unwrap();

    /// Dutch postcode shape (1234 AB).
    pub static ref POSTCODE: Regex = Regex::new(r"(?i)\b\d{4}\s?[a-z]{2}\b").unwrap();

    /// Rejection shapes for vendor scoring.
    pub static ref DATE_LIKE: Regex =
        Regex::new(r"\d{1,4}[-/.]\d{1,2}[-/.]\d{1,4}").unwrap();
    pub static ref TIME_LIKE: Regex = Regex::new(r"\b\d{1,2}:\d{2}\b").unwrap();
    pub static ref AMOUNT_LIKE: Regex =
        Regex::new(r"(?i)(?:€|\beur\b)\s*\d|\d+[.,]\d{2}\b").unwrap();
    pub static ref PAGE_MARKER: Regex = Regex::new(r"(?i)\b(?:pagina|page)\s*\d+").unwrap();
    pub static ref INVOICE_LABEL: Regex =
        Regex::new(r"(?i)^\s*(?:factuur|invoice|rekening|nota|kassabon|receipt)\b").unwrap();

    /// Multi-word title-case line (e.g. "Jansen Advies Groep").
    pub static ref TITLE_CASE_MULTI: Regex =
        Regex::new(r"^(?:[A-Z][a-z]+\s+)+[A-Z][a-z]+$").unwrap();

    /// Known vendor-name patterns matched against the full lowercased corpus.
    pub static ref KNOWN_VENDORS: Vec<Regex> = vec![
        Regex::new(r"albert\s*heijn").unwrap(),
        Regex::new(r"\bjumbo\b").unwrap(),
        Regex::new(r"\blidl\b").unwrap(),
        Regex::new(r"\baldi\b").unwrap(),
        Regex::new(r"ah\.nl").unwrap(),
        Regex::new(r"\baction\b").unwrap(),
        Regex::new(r"\bkruidvat\b").unwrap(),
        Regex::new(r"\betos\b").unwrap(),
        Regex::new(r"\bmediamarkt\b").unwrap(),
        Regex::new(r"\bcoolblue\b").unwrap(),
        Regex::new(r"bol\.com").unwrap(),
        Regex::new(r"amazon\.nl").unwrap(),
        Regex::new(r"\bshell\b").unwrap(),
        Regex::new(r"bp\s*station").unwrap(),
        Regex::new(r"\besso\b").unwrap(),
    ];

    /// Item-number prefix stripped from description lines.
    pub static ref ITEM_PREFIX: Regex = Regex::new(r"^\s*\d{1,4}[.)]?\s+").unwrap();
    /// Trailing amount stripped from description lines. Accepts European
    /// thousands grouping (1.500,00).
    pub static ref TRAILING_AMOUNT: Regex =
        Regex::new(r"\s*(?:€|eur)?\s*\d{1,3}(?:[.,]\d{3})*[.,]\d{2}\s*$").unwrap();
    /// Quantity / time-period line shape.
    pub static ref QUANTITY_SHAPE: Regex = Regex::new(
        r"(?i)^\d+\s*(?:x\b|uur\b|hours?\b|dagen\b|days?\b|maand(?:en)?\b|months?\b|stuks?\b)"
    ).unwrap();
}

/// True if the line is only digits, separators, and whitespace.
pub fn is_purely_numeric(line: &str) -> bool {
    let mut seen_digit = false;
    for c in line.chars() {
        if c.is_ascii_digit() {
            seen_digit = true;
        } else if !c.is_whitespace() && !matches!(c, '.' | ',' | '-' | '/' | ':') {
            return false;
        }
    }
    seen_digit
}

/// True if the line looks like a postal address.
pub fn is_address_like(line: &str) -> bool {
    let lower = line.to_lowercase();
    POSTCODE.is_match(&lower) || ADDRESS_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// True if the line names the customer rather than the vendor.
pub fn is_customer_info(line: &str) -> bool {
    let lower = line.to_lowercase();
    CUSTOMER_KEYWORDS.iter().any(|k| lower.contains(k))
}
