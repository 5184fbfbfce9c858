use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Hard cap on registry lookups per document, protecting the registry's
/// rate limit. Enforced by construction in the relevance filter.
pub const MAX_REGISTRY_LOOKUPS: usize = 2;

/// Immutable per-run configuration, injected at construction.
///
/// Pattern and keyword tables live as static data in their modules; this
/// struct carries the tunable values: domestic jurisdiction, rates, budgets,
/// endpoints, and timeouts.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Domestic country for the VAT treatment decision (alpha-2).
    pub domestic_country: String,
    /// Default standard VAT rate as a fraction.
    pub default_vat_rate: Decimal,
    /// Known VAT rates for closest-rate determination.
    pub known_vat_rates: Vec<Decimal>,
    /// Default currency for assembled records.
    pub currency: String,
    /// Mean-OCR-confidence floor below which a document is flagged.
    pub review_confidence_floor: f64,

    /// Inference endpoints probed in priority order.
    pub llm_endpoints: Vec<String>,
    /// Model name sent with chat-completion requests.
    pub llm_model: String,
    /// Transcript character budget for the inference prompt.
    pub llm_context_budget: usize,
    /// Fraction of the budget kept verbatim from the start of the transcript.
    pub llm_head_fraction: f64,
    /// Fraction of the budget kept verbatim from the end of the transcript.
    pub llm_tail_fraction: f64,
    /// Fail-fast timeout per inference attempt, in seconds.
    pub llm_timeout_secs: u64,

    /// Timeout per registry lookup, in seconds.
    pub registry_timeout_secs: u64,

    /// Label reported in `ocr_metadata.processing_engine`.
    pub processing_engine: String,
    /// Label reported in `ocr_metadata.language`.
    pub language: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            domestic_country: "NL".into(),
            default_vat_rate: dec!(0.21),
            known_vat_rates: vec![dec!(0.06), dec!(0.09), dec!(0.21)],
            currency: "EUR".into(),
            review_confidence_floor: 0.8,
            llm_endpoints: vec![
                "http://localhost:1234/v1".into(),
                "http://127.0.0.1:11434/v1".into(),
            ],
            llm_model: "local".into(),
            llm_context_budget: 6000,
            llm_head_fraction: 0.3,
            llm_tail_fraction: 0.3,
            llm_timeout_secs: 10,
            registry_timeout_secs: 10,
            processing_engine: "PaddleOCR".into(),
            language: "nl/en".into(),
        }
    }
}
