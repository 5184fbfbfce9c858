//! The VAT treatment decision tree — the single authority for VAT type,
//! rate, and review flag.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use crate::core::{
    ExtractionConfig, TextLine, TreatmentStatus, ValidatedSupplier, Validity, VatTreatmentDecision,
    VatType, VatValidationResult, is_eu,
};

/// Sentinel rate meaning reverse charge; never a percentage.
pub const REVERSE_CHARGE_RATE: Decimal = dec!(-1);

/// Free-text wording that suggests reverse charge. Diagnostic only.
const REVERSE_CHARGE_PHRASES: &[&str] = &[
    "btw verlegd",
    "verleggingsregeling",
    "reverse charge",
    "vat reverse charged",
    "intracommunautaire",
    "intra-community supply",
];

/// Evaluate the decision tree once, in strict priority order, over the full
/// validation result set.
///
/// Registry evidence is authoritative; the free-text reverse-charge phrase
/// scan is carried along as a diagnostic flag and never changes the outcome.
pub fn decide_treatment(
    results: &[VatValidationResult],
    lines: &[TextLine],
    config: &ExtractionConfig,
) -> VatTreatmentDecision {
    let hint = reverse_charge_phrase_present(lines);
    let decision = decide(results, config, hint);
    debug!(
        vat_type = ?decision.vat_type,
        status = ?decision.status,
        requires_review = decision.requires_review,
        "vat treatment decided"
    );
    decision
}

fn decide(
    results: &[VatValidationResult],
    config: &ExtractionConfig,
    reverse_charge_hint: bool,
) -> VatTreatmentDecision {
    let domestic = config.domestic_country.as_str();

    // 1. A registry-confirmed foreign supplier settles it: reverse charge.
    if let Some(r) = results
        .iter()
        .find(|r| r.valid == Validity::Valid && !is_domestic(r, domestic))
    {
        return VatTreatmentDecision {
            vat_type: VatType::ReverseCharge,
            vat_rate: REVERSE_CHARGE_RATE,
            status: TreatmentStatus::ValidatedForeign,
            message: format!(
                "Valid EU VAT number {}: reverse charge applies",
                r.vat_number
            ),
            requires_review: false,
            validated_supplier: Some(supplier_from(r)),
            reverse_charge_hint,
        };
    }

    // 2. A registry-confirmed domestic supplier: standard rate.
    if let Some(r) = results
        .iter()
        .find(|r| r.valid == Validity::Valid && is_domestic(r, domestic))
    {
        return VatTreatmentDecision {
            vat_type: VatType::Standard,
            vat_rate: config.default_vat_rate,
            status: TreatmentStatus::ValidatedDomestic,
            message: format!("Valid domestic VAT number {}", r.vat_number),
            requires_review: false,
            validated_supplier: Some(supplier_from(r)),
            reverse_charge_hint,
        };
    }

    // 3. Every definitive answer was negative.
    let invalid: Vec<&str> = results
        .iter()
        .filter(|r| r.valid == Validity::Invalid)
        .map(|r| r.vat_number.as_str())
        .collect();
    if !invalid.is_empty() {
        return VatTreatmentDecision {
            vat_type: VatType::Standard,
            vat_rate: config.default_vat_rate,
            status: TreatmentStatus::InvalidNumber,
            message: format!("VAT number not found in registry: {}", invalid.join(", ")),
            requires_review: true,
            validated_supplier: None,
            reverse_charge_hint,
        };
    }

    // 4. Only unverifiable evidence remains.
    let unknowns: Vec<&VatValidationResult> = results
        .iter()
        .filter(|r| r.valid == Validity::Unknown)
        .collect();
    if !unknowns.is_empty() {
        let foreign_eu = unknowns.iter().find(|r| {
            r.country_code
                .as_deref()
                .is_some_and(|cc| cc != domestic && is_eu(cc))
        });
        if let Some(r) = foreign_eu {
            return VatTreatmentDecision {
                vat_type: VatType::ReverseCharge,
                vat_rate: REVERSE_CHARGE_RATE,
                status: TreatmentStatus::Unverified,
                message: format!(
                    "EU VAT number {} could not be verified: tentative reverse charge",
                    r.vat_number
                ),
                requires_review: true,
                validated_supplier: None,
                reverse_charge_hint,
            };
        }
        return VatTreatmentDecision {
            vat_type: VatType::Standard,
            vat_rate: config.default_vat_rate,
            status: TreatmentStatus::Unverified,
            message: "VAT number could not be verified".into(),
            requires_review: true,
            validated_supplier: None,
            reverse_charge_hint,
        };
    }

    // 5. Nothing to go on.
    VatTreatmentDecision {
        vat_type: VatType::Standard,
        vat_rate: config.default_vat_rate,
        status: TreatmentStatus::NoVatNumber,
        message: "No VAT number found".into(),
        requires_review: true,
        validated_supplier: None,
        reverse_charge_hint,
    }
}

fn is_domestic(result: &VatValidationResult, domestic: &str) -> bool {
    result.country_code.as_deref() == Some(domestic)
}

fn supplier_from(result: &VatValidationResult) -> ValidatedSupplier {
    ValidatedSupplier {
        vat_number: result.vat_number.clone(),
        country_code: result.country_code.clone(),
        company_name: result.company_name.clone(),
        company_address: result.company_address.clone(),
        validated_at: result.validated_at.clone(),
    }
}

/// True if any line carries reverse-charge wording.
pub fn reverse_charge_phrase_present(lines: &[TextLine]) -> bool {
    lines.iter().any(|l| {
        let lower = l.content.to_lowercase();
        REVERSE_CHARGE_PHRASES.iter().any(|p| lower.contains(p))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transcript_from_strings;

    fn config() -> ExtractionConfig {
        ExtractionConfig::default()
    }

    fn result(country: &str, valid: Validity) -> VatValidationResult {
        VatValidationResult {
            vat_number: format!("{country}123456789"),
            country_code: Some(country.into()),
            valid,
            company_name: Some("Testfirma".into()),
            company_address: None,
            validated_at: Some("2024-01-15".into()),
            error_reason: None,
        }
    }

    #[test]
    fn valid_foreign_means_reverse_charge_without_review() {
        let d = decide_treatment(&[result("DE", Validity::Valid)], &[], &config());
        assert_eq!(d.vat_type, VatType::ReverseCharge);
        assert_eq!(d.vat_rate, REVERSE_CHARGE_RATE);
        assert_eq!(d.status, TreatmentStatus::ValidatedForeign);
        assert!(!d.requires_review);
        assert!(d.validated_supplier.is_some());
    }

    #[test]
    fn valid_domestic_means_standard_without_review() {
        let d = decide_treatment(&[result("NL", Validity::Valid)], &[], &config());
        assert_eq!(d.vat_type, VatType::Standard);
        assert_eq!(d.vat_rate, dec!(0.21));
        assert_eq!(d.status, TreatmentStatus::ValidatedDomestic);
        assert!(!d.requires_review);
    }

    #[test]
    fn valid_foreign_outranks_invalid() {
        // Branch 1 before branch 3, regardless of result order.
        let results = vec![result("NL", Validity::Invalid), result("DE", Validity::Valid)];
        let d = decide_treatment(&results, &[], &config());
        assert_eq!(d.vat_type, VatType::ReverseCharge);
        assert!(!d.requires_review);
    }

    #[test]
    fn invalid_numbers_named_in_message() {
        let d = decide_treatment(&[result("NL", Validity::Invalid)], &[], &config());
        assert_eq!(d.status, TreatmentStatus::InvalidNumber);
        assert!(d.requires_review);
        assert!(d.message.contains("NL123456789"));
    }

    #[test]
    fn unknown_foreign_eu_is_tentative_reverse_charge() {
        let d = decide_treatment(&[result("DE", Validity::Unknown)], &[], &config());
        assert_eq!(d.vat_type, VatType::ReverseCharge);
        assert_eq!(d.status, TreatmentStatus::Unverified);
        assert!(d.requires_review);
        assert!(d.validated_supplier.is_none());
    }

    #[test]
    fn unknown_domestic_stays_standard() {
        let d = decide_treatment(&[result("NL", Validity::Unknown)], &[], &config());
        assert_eq!(d.vat_type, VatType::Standard);
        assert!(d.requires_review);
    }

    #[test]
    fn no_results_flags_for_review() {
        let d = decide_treatment(&[], &[], &config());
        assert_eq!(d.status, TreatmentStatus::NoVatNumber);
        assert_eq!(d.message, "No VAT number found");
        assert!(d.requires_review);
    }

    #[test]
    fn phrase_hint_never_overrides_the_tree() {
        let lines = transcript_from_strings(&["BTW verlegd naar afnemer"]);
        let d = decide_treatment(&[result("NL", Validity::Valid)], &lines, &config());
        // Registry says domestic: standard, even though wording says otherwise.
        assert_eq!(d.vat_type, VatType::Standard);
        assert!(d.reverse_charge_hint);
    }

    #[test]
    fn phrase_detection() {
        assert!(reverse_charge_phrase_present(&transcript_from_strings(&[
            "Reverse charge, article 196"
        ])));
        assert!(!reverse_charge_phrase_present(&transcript_from_strings(&[
            "gewone factuur"
        ])));
    }
}
