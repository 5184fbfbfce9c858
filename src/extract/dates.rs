//! Invoice-date extraction with labeled patterns before bare ones.

use chrono::NaiveDate;
use regex::Captures;

use crate::core::{DerivationStage, FieldCandidate, TextLine};
use crate::extract::patterns::{
    DATE_BARE_MONTH, DATE_BARE_NUMERIC, DATE_LABELED_MONTH, DATE_LABELED_NUMERIC, month_number,
};

/// Two-digit years below this value are 20xx, the rest 19xx.
const CENTURY_PIVOT: i32 = 50;

/// Extract the invoice date as an ISO `YYYY-MM-DD` string.
///
/// Labeled dates outrank bare ones; numeric triplets outrank month-name
/// forms only when labeled. Candidates that do not form a real calendar
/// date are skipped, letting later matches and stages take over.
pub fn extract_date(lines: &[TextLine]) -> Option<FieldCandidate> {
    let corpus = lines
        .iter()
        .map(|l| l.content.to_lowercase())
        .collect::<Vec<_>>()
        .join("\n");

    first_valid_numeric(&corpus, &DATE_LABELED_NUMERIC, DerivationStage::LabeledNumeric)
        .or_else(|| first_valid_month(&corpus, &DATE_LABELED_MONTH, DerivationStage::LabeledMonthName))
        .or_else(|| first_valid_month(&corpus, &DATE_BARE_MONTH, DerivationStage::BareMonthName))
        .or_else(|| first_valid_numeric(&corpus, &DATE_BARE_NUMERIC, DerivationStage::BareNumeric))
}

fn first_valid_numeric(
    corpus: &str,
    pattern: &regex::Regex,
    stage: DerivationStage,
) -> Option<FieldCandidate> {
    pattern
        .captures_iter(corpus)
        .find_map(|caps| slot_numeric(&caps))
        .map(|date| FieldCandidate::new(date.format("%Y-%m-%d").to_string(), stage))
}

fn first_valid_month(
    corpus: &str,
    pattern: &regex::Regex,
    stage: DerivationStage,
) -> Option<FieldCandidate> {
    pattern
        .captures_iter(corpus)
        .find_map(|caps| slot_month_name(&caps))
        .map(|date| FieldCandidate::new(date.format("%Y-%m-%d").to_string(), stage))
}

// Slot a numeric triplet into day/month/year: a four-digit first group is
// year-first, a four-digit last group is day-first, otherwise the last
// group is a two-digit year.
fn slot_numeric(caps: &Captures<'_>) -> Option<NaiveDate> {
    let g1 = &caps[1];
    let g2 = &caps[2];
    let g3 = &caps[3];

    let (year, month, day) = if g1.len() == 4 {
        (g1.parse().ok()?, g2.parse().ok()?, g3.parse().ok()?)
    } else if g3.len() == 4 {
        (g3.parse().ok()?, g2.parse().ok()?, g1.parse().ok()?)
    } else {
        let year = expand_century(g3.parse().ok()?);
        (year, g2.parse().ok()?, g1.parse().ok()?)
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

fn slot_month_name(caps: &Captures<'_>) -> Option<NaiveDate> {
    let day: u32 = caps[1].parse().ok()?;
    let month = month_number(&caps[2])?;
    let raw_year = &caps[3];
    let year: i32 = raw_year.parse().ok()?;
    let year = if raw_year.len() == 4 {
        year
    } else {
        expand_century(year)
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

fn expand_century(two_digit: i32) -> i32 {
    if two_digit < CENTURY_PIVOT {
        2000 + two_digit
    } else {
        1900 + two_digit
    }
}
