//! Property tests for the extraction invariants.

use bonnetje::core::{ExtractionConfig, transcript_from_strings};
use bonnetje::extract::{extract_amounts, extract_date, extract_vendor};
use proptest::prelude::*;
use rust_decimal::Decimal;

proptest! {
    // Whenever both VAT and net come out, they reconcile with the total.
    #[test]
    fn amounts_always_reconcile(cents in 1u64..1_000_000) {
        let euros = Decimal::from(cents) / Decimal::from(100);
        let lines = transcript_from_strings(&[format!("totaal € {}", euros.to_string().replace('.', ","))]);
        let a = extract_amounts(&lines, &ExtractionConfig::default());
        if let (Some(total), Some(net), Some(vat)) = (a.total_amount, a.net_amount, a.vat_amount) {
            prop_assert!((total - (net + vat)).abs() <= Decimal::new(1, 2));
            prop_assert!(net >= Decimal::ZERO);
            prop_assert!(vat >= Decimal::ZERO);
        }
    }

    // Every extracted date is ISO-shaped with the documented century pivot.
    #[test]
    fn dates_normalize_with_century_pivot(day in 1u32..=28, month in 1u32..=12, year in 0u32..=99) {
        let lines = transcript_from_strings(&[format!("datum: {day:02}-{month:02}-{year:02}")]);
        let d = extract_date(&lines).expect("valid calendar date must extract");
        let expected_year = if year < 50 { 2000 + year } else { 1900 + year };
        prop_assert_eq!(d.text, format!("{expected_year}-{month:02}-{day:02}"));
    }

    // Extraction is a pure function of the transcript.
    #[test]
    fn extraction_is_deterministic(lines in proptest::collection::vec("[a-zA-Z0-9 €,.:%-]{0,40}", 0..12)) {
        let transcript = transcript_from_strings(&lines);
        let config = ExtractionConfig::default();
        let first = (
            extract_vendor(&transcript),
            extract_date(&transcript),
            extract_amounts(&transcript, &config),
        );
        let second = (
            extract_vendor(&transcript),
            extract_date(&transcript),
            extract_amounts(&transcript, &config),
        );
        prop_assert_eq!(first, second);
    }
}
