//! Tolerant parsing of inference output.
//!
//! Models wrap JSON in prose, code fences, and the occasional comment. The
//! scanner finds brace-balanced spans, cleans each, and accepts the first
//! one that parses with a vendor and at least one amount.

use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// Fields the inference response is expected to carry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LlmExtraction {
    pub vendor_name: Option<String>,
    pub description: Option<String>,
    pub total_amount: Option<Decimal>,
    pub net_amount: Option<Decimal>,
    pub vat_amount: Option<Decimal>,
    pub vat_rate: Option<Decimal>,
    pub date: Option<String>,
    pub reverse_charge: Option<bool>,
    pub currency: Option<String>,
}

impl LlmExtraction {
    /// Minimum to be usable downstream: a vendor and one amount.
    fn acceptable(&self) -> bool {
        self.vendor_name.is_some()
            && (self.total_amount.is_some()
                || self.net_amount.is_some()
                || self.vat_amount.is_some())
    }
}

/// Extract the first acceptable JSON object embedded in `text`.
pub fn parse_extraction(text: &str) -> Option<LlmExtraction> {
    balanced_object_spans(text)
        .into_iter()
        .find_map(|span| {
            let cleaned = strip_noise(&span);
            let value: Value = serde_json::from_str(&cleaned).ok()?;
            let extraction = from_value(&value);
            extraction.acceptable().then_some(extraction)
        })
}

/// All brace-balanced `{...}` spans, outermost only, string-aware.
fn balanced_object_spans(text: &str) -> Vec<String> {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    if let Some(s) = start.take() {
                        spans.push(text[s..=i].to_string());
                    }
                }
            }
            _ => {}
        }
    }
    spans
}

// Strip code-fence markers and whole-line comments. Comments are only
// recognized at line starts so URLs inside strings survive.
fn strip_noise(span: &str) -> String {
    span.lines()
        .filter(|line| {
            let t = line.trim_start();
            !t.starts_with("```") && !t.starts_with("//") && !t.starts_with('#')
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn from_value(value: &Value) -> LlmExtraction {
    LlmExtraction {
        vendor_name: string_field(value, "vendor_name"),
        description: string_field(value, "description"),
        total_amount: decimal_field(value, "total_amount"),
        net_amount: decimal_field(value, "net_amount"),
        vat_amount: decimal_field(value, "vat_amount"),
        vat_rate: decimal_field(value, "vat_rate"),
        date: string_field(value, "date"),
        reverse_charge: bool_field(value, "reverse_charge"),
        currency: string_field(value, "currency"),
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => {
            let t = s.trim();
            (!t.is_empty() && t != "null" && t != "unknown").then(|| t.to_string())
        }
        _ => None,
    }
}

// Amounts arrive as numbers or as strings with currency decoration.
// Negative values never appear on receipts and are dropped as misreads.
fn decimal_field(value: &Value, key: &str) -> Option<Decimal> {
    let parsed = match value.get(key)? {
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
                .collect();
            Decimal::from_str(&cleaned.replace(',', ".")).ok()
        }
        _ => None,
    };
    parsed.filter(|d| !d.is_sign_negative())
}

fn bool_field(value: &Value, key: &str) -> Option<bool> {
    match value.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "ja" => Some(true),
            "false" | "no" | "nee" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn plain_object_parses() {
        let out = parse_extraction(
            r#"{"vendor_name":"Jansen B.V.","total_amount":121.0,"vat_rate":0.21}"#,
        )
        .unwrap();
        assert_eq!(out.vendor_name.as_deref(), Some("Jansen B.V."));
        assert_eq!(out.total_amount, Some(dec!(121.0)));
        assert_eq!(out.vat_rate, Some(dec!(0.21)));
    }

    #[test]
    fn object_embedded_in_prose_and_fences() {
        let text = "Here is the extraction you asked for:\n```json\n{\n  \"vendor_name\": \"Kiosk\",\n  \"total_amount\": \"€ 12,50\"\n}\n```\nLet me know if you need anything else.";
        let out = parse_extraction(text).unwrap();
        assert_eq!(out.vendor_name.as_deref(), Some("Kiosk"));
        assert_eq!(out.total_amount, Some(dec!(12.50)));
    }

    #[test]
    fn comment_lines_stripped() {
        let text = "{\n// model note\n\"vendor_name\": \"Kiosk\",\n\"vat_amount\": 2.17\n}";
        let out = parse_extraction(text).unwrap();
        assert_eq!(out.vat_amount, Some(dec!(2.17)));
    }

    #[test]
    fn url_in_string_survives_comment_stripping() {
        let text = r#"{"vendor_name":"Webshop http://example.test","total_amount":10.0}"#;
        let out = parse_extraction(text).unwrap();
        assert_eq!(
            out.vendor_name.as_deref(),
            Some("Webshop http://example.test")
        );
    }

    #[test]
    fn first_acceptable_span_wins() {
        let text = r#"{"note":"not an extraction"} {"vendor_name":"Kiosk","total_amount":5.0}"#;
        let out = parse_extraction(text).unwrap();
        assert_eq!(out.vendor_name.as_deref(), Some("Kiosk"));
    }

    #[test]
    fn vendor_without_amounts_rejected() {
        assert!(parse_extraction(r#"{"vendor_name":"Kiosk"}"#).is_none());
    }

    #[test]
    fn braces_inside_strings_do_not_break_balancing() {
        let text = r#"{"vendor_name":"Curly {brace} Co","total_amount":1.0}"#;
        let out = parse_extraction(text).unwrap();
        assert_eq!(out.vendor_name.as_deref(), Some("Curly {brace} Co"));
    }

    #[test]
    fn unknown_placeholder_strings_dropped() {
        let out = parse_extraction(
            r#"{"vendor_name":"Kiosk","date":"unknown","total_amount":3.0}"#,
        )
        .unwrap();
        assert_eq!(out.date, None);
    }

    #[test]
    fn negative_amounts_rejected() {
        // A lone negative amount leaves nothing acceptable.
        assert!(parse_extraction(r#"{"vendor_name":"Kiosk","total_amount":-5.0}"#).is_none());
        let out = parse_extraction(
            r#"{"vendor_name":"Kiosk","total_amount":10.0,"vat_amount":"-3,50"}"#,
        )
        .unwrap();
        assert_eq!(out.total_amount, Some(dec!(10.0)));
        assert_eq!(out.vat_amount, None);
    }

    #[test]
    fn no_json_at_all() {
        assert!(parse_extraction("sorry, I could not read the receipt").is_none());
    }

    #[test]
    fn reverse_charge_string_coerced() {
        let out = parse_extraction(
            r#"{"vendor_name":"Kiosk","total_amount":1.0,"reverse_charge":"yes"}"#,
        )
        .unwrap();
        assert_eq!(out.reverse_charge, Some(true));
    }
}
