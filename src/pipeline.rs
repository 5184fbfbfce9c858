//! End-to-end processing of one transcript and assembly of the final record.
//!
//! The LLM path is an enhancement: when it produces an acceptable object,
//! its fields form the base record; otherwise the rule-based extractors do
//! and the document is flagged for review. The VAT treatment decision and
//! identifier evidence are layered on top in both cases.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

use crate::core::{
    ExtractionConfig, ExtractionError, TextLine, TreatmentStatus, ValidatedSupplier, VatNumberCandidate,
    VatTreatmentDecision, VatType, VatValidationResult, country_hint_from_name, mean_confidence,
};
use crate::extract::{
    closest_known_rate, extract_amounts, extract_date, extract_description, extract_vendor,
};
use crate::llm::{InferenceClient, SYSTEM_PROMPT, budget_transcript, parse_extraction, user_prompt};
use crate::vat::{
    VatRegistry, decide_treatment, extract_vat_numbers, filter_candidates, unvalidated_results,
    validate_candidates,
};

/// Which path produced the base record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    Llm,
    Rules,
}

/// The extracted field block of a success record.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractedData {
    pub vendor_name: Option<String>,
    pub expense_date: Option<String>,
    pub description: Option<String>,
    /// Net (ex-VAT) amount.
    pub amount: Option<Decimal>,
    pub vat_amount: Option<Decimal>,
    pub vat_rate: Decimal,
    pub total_amount: Option<Decimal>,
    pub currency: String,
    pub expense_type: &'static str,
    pub suggested_vat_type: VatType,
    pub suggested_vat_rate: Decimal,
    pub vat_validation_status: TreatmentStatus,
    pub vat_validation_message: String,
    pub requires_manual_review: bool,
    pub is_likely_foreign_supplier: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validated_supplier: Option<ValidatedSupplier>,
}

/// Transcript-level metadata carried along for the reviewer.
#[derive(Debug, Clone, Serialize)]
pub struct OcrMetadata {
    pub line_count: usize,
    pub processing_engine: String,
    pub language: String,
    pub confidence_scores: Vec<f64>,
}

/// VAT-identifier evidence attached when any candidate was found.
#[derive(Debug, Clone, Serialize)]
pub struct VatNumberReport {
    /// Candidates forwarded to validation, ranked.
    pub extracted: Vec<VatNumberCandidate>,
    pub vies_validation: Vec<VatValidationResult>,
    pub validation_count: usize,
    /// Candidates found before relevance filtering.
    pub total_extracted: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuccessRecord {
    pub success: bool,
    pub confidence: f64,
    pub raw_text: String,
    pub extracted_data: ExtractedData,
    pub extraction_method: ExtractionMethod,
    pub ocr_metadata: OcrMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vat_numbers: Option<VatNumberReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailureRecord {
    pub success: bool,
    pub error: String,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_info: Option<serde_json::Value>,
}

/// The one record every processing path terminates in.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum DocumentRecord {
    Success(Box<SuccessRecord>),
    Failure(FailureRecord),
}

impl DocumentRecord {
    /// Build a failure record from any pipeline error.
    pub fn failure(error: &ExtractionError, debug_info: Option<serde_json::Value>) -> Self {
        Self::Failure(FailureRecord {
            success: false,
            error: error.to_string(),
            confidence: 0.0,
            debug_info: debug_info.or_else(|| {
                Some(serde_json::json!({ "error_type": error.kind() }))
            }),
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

// Base fields shared by both extraction paths before the decision is
// layered on.
struct BaseFields {
    vendor: Option<String>,
    date: Option<String>,
    description: Option<String>,
    total: Option<Decimal>,
    net: Option<Decimal>,
    vat: Option<Decimal>,
    vat_rate: Decimal,
    currency: String,
    method: ExtractionMethod,
}

/// Process one transcript into a document record.
///
/// `registry` and `inference` are optional collaborators: without a
/// registry every forwarded VAT candidate stays unknown; without an
/// inference client (or when it fails) the rule-based extractors run and
/// the document is flagged for review.
pub async fn process_transcript(
    lines: &[TextLine],
    config: &ExtractionConfig,
    registry: Option<&dyn VatRegistry>,
    inference: Option<&dyn InferenceClient>,
) -> DocumentRecord {
    if lines.is_empty() {
        return DocumentRecord::failure(&ExtractionError::EmptyTranscript, None);
    }

    let confidence = round2(mean_confidence(lines));
    let raw_text = lines
        .iter()
        .map(|l| l.content.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    // VAT evidence path, independent of which extraction path wins.
    let all_candidates = extract_vat_numbers(lines);
    let forwarded = filter_candidates(all_candidates.clone(), config);
    let results = match registry {
        Some(registry) => validate_candidates(&forwarded, registry).await,
        None => unvalidated_results(&forwarded),
    };
    let decision = decide_treatment(&results, lines, config);

    let base = match llm_fields(lines, config, inference).await {
        Some(base) => base,
        None => rules_fields(lines, config),
    };
    info!(
        method = ?base.method,
        vendor = base.vendor.as_deref().unwrap_or("-"),
        "transcript processed"
    );

    let requires_review = confidence < config.review_confidence_floor
        || base.vendor.is_none()
        || base.total.is_none()
        || base.method == ExtractionMethod::Rules
        || decision.requires_review;
    let method = base.method;

    let record = SuccessRecord {
        success: true,
        confidence,
        raw_text,
        extracted_data: assemble_data(base, &decision, requires_review, config),
        extraction_method: method,
        ocr_metadata: OcrMetadata {
            line_count: lines.len(),
            processing_engine: config.processing_engine.clone(),
            language: config.language.clone(),
            confidence_scores: lines.iter().map(|l| l.confidence).collect(),
        },
        vat_numbers: (!all_candidates.is_empty()).then(|| VatNumberReport {
            validation_count: results.len(),
            total_extracted: all_candidates.len(),
            extracted: forwarded,
            vies_validation: results,
        }),
    };
    DocumentRecord::Success(Box::new(record))
}

async fn llm_fields(
    lines: &[TextLine],
    config: &ExtractionConfig,
    inference: Option<&dyn InferenceClient>,
) -> Option<BaseFields> {
    let client = inference?;
    let transcript = budget_transcript(
        lines,
        config.llm_context_budget,
        config.llm_head_fraction,
        config.llm_tail_fraction,
    );
    let response = match client.complete(SYSTEM_PROMPT, &user_prompt(&transcript)).await {
        Ok(text) => text,
        Err(err) => {
            debug!(error = %err, "inference unavailable, falling back to rules");
            return None;
        }
    };
    let extraction = parse_extraction(&response)?;

    let mut total = extraction.total_amount;
    let mut net = extraction.net_amount;
    let mut vat = extraction.vat_amount;
    // A VAT amount exceeding the total is a misread; drop it rather than
    // derive a negative net.
    if let (Some(t), Some(v)) = (total, vat) {
        if v > t {
            debug!(total = %t, vat = %v, "dropping impossible inference VAT amount");
            vat = None;
        }
    }
    if let (Some(t), Some(v), None) = (total, vat, net) {
        net = Some(t - v);
    }
    if let (None, Some(n), Some(v)) = (total, net, vat) {
        total = Some(n + v);
    }
    if let (Some(t), Some(n), None) = (total, net, vat) {
        if t >= n {
            vat = Some(t - n);
        }
    }

    let vat_rate = extraction.vat_rate.unwrap_or_else(|| match (vat, net) {
        (Some(v), Some(n)) if n > Decimal::ZERO => {
            closest_known_rate(v / n, &config.known_vat_rates)
        }
        _ => config.default_vat_rate,
    });

    Some(BaseFields {
        vendor: extraction.vendor_name,
        date: extraction.date,
        description: extraction.description,
        total,
        net,
        vat,
        vat_rate,
        currency: extraction.currency.unwrap_or_else(|| config.currency.clone()),
        method: ExtractionMethod::Llm,
    })
}

fn rules_fields(lines: &[TextLine], config: &ExtractionConfig) -> BaseFields {
    let amounts = extract_amounts(lines, config);
    BaseFields {
        vendor: extract_vendor(lines).map(|c| c.text),
        date: extract_date(lines).map(|c| c.text),
        description: extract_description(lines).map(|c| c.text),
        total: amounts.total_amount,
        net: amounts.net_amount,
        vat: amounts.vat_amount,
        vat_rate: amounts.vat_rate,
        currency: config.currency.clone(),
        method: ExtractionMethod::Rules,
    }
}

fn assemble_data(
    base: BaseFields,
    decision: &VatTreatmentDecision,
    requires_review: bool,
    config: &ExtractionConfig,
) -> ExtractedData {
    // Legal-entity suffix in the vendor name is a diagnostic signal only;
    // it never feeds the treatment decision.
    let name_hint = base
        .vendor
        .as_deref()
        .and_then(country_hint_from_name)
        .is_some_and(|cc| cc != config.domestic_country);
    ExtractedData {
        expense_type: categorize_expense(base.vendor.as_deref()),
        is_likely_foreign_supplier: decision.vat_type == VatType::ReverseCharge
            || decision.reverse_charge_hint
            || name_hint,
        vendor_name: base.vendor,
        expense_date: base.date,
        description: base.description,
        amount: base.net,
        vat_amount: base.vat,
        vat_rate: base.vat_rate,
        total_amount: base.total,
        currency: base.currency,
        suggested_vat_type: decision.vat_type,
        suggested_vat_rate: decision.vat_rate,
        vat_validation_status: decision.status,
        vat_validation_message: decision.message.clone(),
        requires_manual_review: requires_review,
        validated_supplier: decision.validated_supplier.clone(),
    }
}

/// Coarse expense category from the vendor name.
pub fn categorize_expense(vendor: Option<&str>) -> &'static str {
    let Some(vendor) = vendor else {
        return "other";
    };
    let vendor = vendor.to_lowercase();
    let matches = |names: &[&str]| names.iter().any(|n| vendor.contains(n));

    if matches(&["albert heijn", "jumbo", "lidl", "aldi"]) {
        "meals"
    } else if matches(&["shell", "bp", "total", "esso"]) {
        "travel"
    } else if matches(&["mediamarkt", "coolblue", "bol.com", "amazon"]) {
        "equipment"
    } else {
        "other"
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transcript_from_strings;
    use rust_decimal_macros::dec;

    fn config() -> ExtractionConfig {
        ExtractionConfig::default()
    }

    fn success(record: DocumentRecord) -> SuccessRecord {
        match record {
            DocumentRecord::Success(s) => *s,
            DocumentRecord::Failure(f) => panic!("expected success, got failure: {}", f.error),
        }
    }

    #[tokio::test]
    async fn empty_transcript_fails_with_fixed_message() {
        let record = process_transcript(&[], &config(), None, None).await;
        match record {
            DocumentRecord::Failure(f) => {
                assert!(!f.success);
                assert_eq!(f.error, "No text could be extracted from image");
                assert_eq!(f.confidence, 0.0);
            }
            DocumentRecord::Success(_) => panic!("expected failure"),
        }
    }

    #[tokio::test]
    async fn rules_path_always_flags_for_review() {
        let lines = transcript_from_strings(&["Jansen B.V.", "TOTAAL € 121,00"]);
        let record = success(process_transcript(&lines, &config(), None, None).await);
        assert_eq!(record.extraction_method, ExtractionMethod::Rules);
        assert!(record.extracted_data.requires_manual_review);
    }

    #[tokio::test]
    async fn dutch_receipt_back_computes_vat() {
        let lines = transcript_from_strings(&["Jansen B.V.", "TOTAAL € 121,00"]);
        let record = success(process_transcript(&lines, &config(), None, None).await);
        let data = record.extracted_data;
        assert_eq!(data.vat_rate, dec!(0.21));
        assert_eq!(data.vat_amount, Some(dec!(21.00)));
        assert_eq!(data.amount, Some(dec!(100.00)));
        assert_eq!(data.total_amount, Some(dec!(121.00)));
    }

    #[tokio::test]
    async fn no_vat_number_yields_standard_with_review() {
        let lines = transcript_from_strings(&["Jansen B.V.", "TOTAAL € 121,00"]);
        let record = success(process_transcript(&lines, &config(), None, None).await);
        let data = record.extracted_data;
        assert_eq!(data.suggested_vat_type, VatType::Standard);
        assert_eq!(data.vat_validation_status, TreatmentStatus::NoVatNumber);
        assert!(record.vat_numbers.is_none());
    }

    #[tokio::test]
    async fn vat_evidence_attached_when_candidates_found() {
        let lines = transcript_from_strings(&[
            "Musterfirma GmbH",
            "USt-ID: DE123456789",
            "TOTAAL € 121,00",
        ]);
        let record = success(process_transcript(&lines, &config(), None, None).await);
        let report = record.vat_numbers.expect("evidence block");
        assert_eq!(report.total_extracted, 1);
        assert_eq!(report.validation_count, 1);
        // No registry: unverified foreign EU number, tentative reverse charge.
        assert_eq!(
            record.extracted_data.suggested_vat_type,
            VatType::ReverseCharge
        );
        assert_eq!(record.extracted_data.suggested_vat_rate, dec!(-1));
        assert!(record.extracted_data.requires_manual_review);
    }

    #[tokio::test]
    async fn identical_input_identical_output() {
        let lines = transcript_from_strings(&[
            "Jansen Consultancy B.V.",
            "Factuurdatum: 15-01-2024",
            "Consultancy diensten",
            "TOTAAL € 121,00",
        ]);
        let a = process_transcript(&lines, &config(), None, None).await;
        let b = process_transcript(&lines, &config(), None, None).await;
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[tokio::test]
    async fn confidence_below_floor_flags_review() {
        let lines = vec![
            TextLine::new("Jansen B.V.", 0.5, 0),
            TextLine::new("TOTAAL € 121,00", 0.6, 1),
        ];
        let record = success(process_transcript(&lines, &config(), None, None).await);
        assert!(record.confidence < 0.8);
        assert!(record.extracted_data.requires_manual_review);
    }

    #[tokio::test]
    async fn foreign_entity_suffix_flags_supplier_without_vat_evidence() {
        let lines = transcript_from_strings(&["Musterfirma GmbH", "TOTAAL € 121,00"]);
        let record = success(process_transcript(&lines, &config(), None, None).await);
        let data = record.extracted_data;
        // Hint stays diagnostic: treatment is still standard/no-VAT-number.
        assert_eq!(data.suggested_vat_type, VatType::Standard);
        assert_eq!(data.vat_validation_status, TreatmentStatus::NoVatNumber);
        assert!(data.is_likely_foreign_supplier);
    }

    #[tokio::test]
    async fn domestic_entity_suffix_is_not_flagged() {
        let lines = transcript_from_strings(&["Jansen B.V.", "TOTAAL € 121,00"]);
        let record = success(process_transcript(&lines, &config(), None, None).await);
        assert!(!record.extracted_data.is_likely_foreign_supplier);
    }

    #[test]
    fn expense_categories() {
        assert_eq!(categorize_expense(Some("Albert Heijn 1403")), "meals");
        assert_eq!(categorize_expense(Some("Shell Station A2")), "travel");
        assert_eq!(categorize_expense(Some("Coolblue B.V.")), "equipment");
        assert_eq!(categorize_expense(Some("Jansen Advies")), "other");
        assert_eq!(categorize_expense(None), "other");
    }

    #[test]
    fn success_record_serializes_expected_shape() {
        let lines = transcript_from_strings(&["Jansen B.V.", "TOTAAL € 121,00"]);
        let record = futures_block(process_transcript(&lines, &config(), None, None));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["success"], true);
        assert!(json["extracted_data"]["vendor_name"].is_string());
        assert_eq!(json["extraction_method"], "rules");
        assert_eq!(json["ocr_metadata"]["line_count"], 2);
    }

    // Minimal executor for the one non-async serialization test.
    fn futures_block<F: std::future::Future>(fut: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(fut)
    }
}
