use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One recognized line of the OCR transcript.
///
/// Order is the OCR engine's reading order and is semantically significant:
/// the extractors use line indices for proximity heuristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    /// Recognized text content.
    pub content: String,
    /// Recognition confidence in `[0, 1]`.
    pub confidence: f64,
    /// Position in the transcript (0-based reading order).
    pub index: usize,
}

impl TextLine {
    pub fn new(content: impl Into<String>, confidence: f64, index: usize) -> Self {
        Self {
            content: content.into(),
            confidence,
            index,
        }
    }
}

/// Build a transcript from bare strings, numbering lines in reading order.
/// All lines get confidence 1.0.
pub fn transcript_from_strings<S: AsRef<str>>(lines: &[S]) -> Vec<TextLine> {
    lines
        .iter()
        .enumerate()
        .map(|(i, s)| TextLine::new(s.as_ref(), 1.0, i))
        .collect()
}

/// Mean recognition confidence over the transcript, 0.0 when empty.
pub fn mean_confidence(lines: &[TextLine]) -> f64 {
    if lines.is_empty() {
        return 0.0;
    }
    lines.iter().map(|l| l.confidence).sum::<f64>() / lines.len() as f64
}

/// Which cascade stage produced a candidate. Recorded for traceability only;
/// never branches behavior downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivationStage {
    LegalEntity,
    UppercaseHeader,
    KnownVendor,
    InvoiceProximity,
    ScoredScan,
    Fallback,
    LabeledNumeric,
    LabeledMonthName,
    BareMonthName,
    BareNumeric,
    ServiceKeyword,
    IndicatorWindow,
    DomainPhrase,
    QuantityShape,
}

/// A vendor / date / description candidate with its derivation stage.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldCandidate {
    pub text: String,
    pub stage: DerivationStage,
}

impl FieldCandidate {
    pub fn new(text: impl Into<String>, stage: DerivationStage) -> Self {
        Self {
            text: text.into(),
            stage,
        }
    }
}

/// A monetary amount matched in the transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct AmountCandidate {
    /// Parsed value, always >= 0.
    pub value: Decimal,
    /// The raw matched text.
    pub raw_match: String,
    /// Position of the matching pattern in the cascade (0 = most specific).
    pub pattern_priority: usize,
}

/// How a VAT number candidate was matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VatExtractionMethod {
    /// Matched a per-country fixed-shape pattern.
    CountryPattern,
    /// Matched a generic EU-shaped or label-anchored pattern.
    GenericPattern,
}

/// A VAT-number-shaped token found in the transcript.
///
/// Identity is the normalized `(country_code, digits)` pair; duplicates
/// collapse keeping the first occurrence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VatNumberCandidate {
    /// 2-letter country code, absent when no prefix and no context inference.
    pub country_code: Option<String>,
    /// Normalized uppercase alphanumeric number without the country prefix.
    pub digits: String,
    /// Content of the line the match came from.
    pub line_context: String,
    /// Transcript index of that line.
    pub line_number: usize,
    pub extraction_method: VatExtractionMethod,
    /// Set by the relevance filter; 0 until scored.
    pub relevance_score: i32,
}

impl VatNumberCandidate {
    /// Full identifier with country prefix when known (e.g. "NL123456789B01").
    pub fn display_number(&self) -> String {
        match &self.country_code {
            Some(cc) => format!("{cc}{}", self.digits),
            None => self.digits.clone(),
        }
    }
}

/// Tri-state registry validity. `Unknown` means the check failed, timed out,
/// or was rate-limited — it is never treated as `Invalid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Validity {
    Valid,
    Invalid,
    Unknown,
}

/// Outcome of one registry lookup for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VatValidationResult {
    /// The checked number including country prefix.
    pub vat_number: String,
    pub country_code: Option<String>,
    pub valid: Validity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
}

/// Supplier identity confirmed by the registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedSupplier {
    pub vat_number: String,
    pub country_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validated_at: Option<String>,
}

/// The VAT treatment applied to the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VatType {
    Standard,
    ReverseCharge,
}

/// How the treatment decision was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreatmentStatus {
    /// Registry confirmed a non-domestic EU supplier.
    ValidatedForeign,
    /// Registry confirmed a domestic supplier.
    ValidatedDomestic,
    /// Registry rejected every checked number.
    InvalidNumber,
    /// Only unverifiable evidence; tentative decision.
    Unverified,
    /// No VAT number found at all.
    NoVatNumber,
}

/// Authoritative VAT treatment decision for one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VatTreatmentDecision {
    pub vat_type: VatType,
    /// Rate as a fraction (e.g. 0.21), or the -1 sentinel which means
    /// reverse charge and must never be read as a percentage.
    pub vat_rate: Decimal,
    pub status: TreatmentStatus,
    pub message: String,
    pub requires_review: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validated_supplier: Option<ValidatedSupplier>,
    /// Free-text reverse-charge wording was seen in the transcript.
    /// Diagnostic only — never overrides the decision above.
    pub reverse_charge_hint: bool,
}
