//! Context budgeting for the inference prompt.
//!
//! Receipts put identity at the top and money at the bottom; the middle is
//! mostly line items. When a transcript exceeds the character budget, the
//! head and tail survive verbatim and the middle is ranked.

use crate::core::TextLine;
use crate::extract::patterns::AMOUNT_LIKE;

/// Marker inserted where middle lines were dropped.
pub const ELISION_MARKER: &str = "[...]";

const KEYWORDS: &[&str] = &[
    "totaal", "total", "subtotaal", "btw", "vat", "factuur", "invoice", "datum", "date",
];

/// Fit the transcript into `budget` characters.
///
/// Under budget the transcript passes through untouched. Over budget, the
/// head and tail fractions are kept verbatim and the remaining room is
/// filled with the best-scoring middle lines, elision markers standing in
/// for the rest. If assembly still overruns, a flat prefix truncation is
/// the last resort.
pub fn budget_transcript(
    lines: &[TextLine],
    budget: usize,
    head_fraction: f64,
    tail_fraction: f64,
) -> String {
    let full = join(lines);
    if full.chars().count() <= budget {
        return full;
    }

    let head_budget = (budget as f64 * head_fraction) as usize;
    let tail_budget = (budget as f64 * tail_fraction) as usize;

    let head_end = take_chars_forward(lines, head_budget);
    let tail_start = take_chars_backward(lines, tail_budget).max(head_end);
    let middle = &lines[head_end..tail_start];

    let middle_budget = budget
        .saturating_sub(head_budget)
        .saturating_sub(tail_budget)
        .saturating_sub(ELISION_MARKER.len() * 2);
    let kept_middle = pick_middle(middle, middle_budget);

    let mut parts: Vec<&str> = lines[..head_end].iter().map(|l| l.content.as_str()).collect();
    let mut previous_index = head_end;
    for line in &kept_middle {
        if line.index > previous_index {
            parts.push(ELISION_MARKER);
        }
        parts.push(&line.content);
        previous_index = line.index + 1;
    }
    if previous_index < tail_start {
        parts.push(ELISION_MARKER);
    }
    parts.extend(lines[tail_start..].iter().map(|l| l.content.as_str()));

    let assembled = parts.join("\n");
    if assembled.chars().count() <= budget {
        assembled
    } else {
        truncate_chars(&full, budget)
    }
}

/// Rank a middle line: currency amounts first, then fiscal keywords, then
/// anything with a digit.
pub fn line_priority(content: &str) -> u8 {
    if AMOUNT_LIKE.is_match(content) {
        return 3;
    }
    let lower = content.to_lowercase();
    if KEYWORDS.iter().any(|k| lower.contains(k)) {
        return 2;
    }
    if content.chars().any(|c| c.is_ascii_digit()) {
        return 1;
    }
    0
}

fn pick_middle<'a>(middle: &'a [TextLine], budget: usize) -> Vec<&'a TextLine> {
    let mut ranked: Vec<&TextLine> = middle.iter().collect();
    ranked.sort_by_key(|l| std::cmp::Reverse(line_priority(&l.content)));

    let mut used = 0;
    let mut picked: Vec<&TextLine> = Vec::new();
    for line in ranked {
        let cost = line.content.chars().count() + 1;
        if used + cost > budget {
            continue;
        }
        used += cost;
        picked.push(line);
    }
    picked.sort_by_key(|l| l.index);
    picked
}

// Number of leading lines fitting the budget.
fn take_chars_forward(lines: &[TextLine], budget: usize) -> usize {
    let mut used = 0;
    for (i, line) in lines.iter().enumerate() {
        used += line.content.chars().count() + 1;
        if used > budget {
            return i;
        }
    }
    lines.len()
}

// Index where the fitting trailing lines start.
fn take_chars_backward(lines: &[TextLine], budget: usize) -> usize {
    let mut used = 0;
    for (i, line) in lines.iter().enumerate().rev() {
        used += line.content.chars().count() + 1;
        if used > budget {
            return i + 1;
        }
    }
    0
}

fn join(lines: &[TextLine]) -> String {
    lines
        .iter()
        .map(|l| l.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transcript_from_strings;

    #[test]
    fn under_budget_passes_through() {
        let lines = transcript_from_strings(&["KIOSK", "totaal € 12,00"]);
        let out = budget_transcript(&lines, 1000, 0.3, 0.3);
        assert_eq!(out, "KIOSK\ntotaal € 12,00");
    }

    #[test]
    fn over_budget_keeps_head_and_tail() {
        let mut raw = vec!["JANSEN B.V.".to_string()];
        for i in 0..200 {
            raw.push(format!("artikel nummer {i} zonder belang"));
        }
        raw.push("TOTAAL € 121,00".to_string());
        let lines = transcript_from_strings(&raw);

        let out = budget_transcript(&lines, 500, 0.3, 0.3);
        assert!(out.chars().count() <= 500);
        assert!(out.starts_with("JANSEN B.V."));
        assert!(out.ends_with("TOTAAL € 121,00"));
        assert!(out.contains(ELISION_MARKER));
    }

    #[test]
    fn amount_lines_outrank_plain_middle_lines() {
        let mut raw = vec!["KOP".to_string()];
        for i in 0..100 {
            raw.push(format!("vulregel nummer honderdduizend en nog wat {i}"));
        }
        raw.push("btw 21% € 4,20".to_string());
        for i in 0..100 {
            raw.push(format!("nog een vulregel zonder cijferwaarde nr {i}"));
        }
        raw.push("STAART".to_string());
        let lines = transcript_from_strings(&raw);

        let out = budget_transcript(&lines, 400, 0.1, 0.1);
        assert!(out.contains("btw 21% € 4,20"));
    }

    #[test]
    fn priorities_ordered() {
        assert_eq!(line_priority("€ 12,50"), 3);
        assert_eq!(line_priority("factuurdatum"), 2);
        assert_eq!(line_priority("regel 7"), 1);
        assert_eq!(line_priority("gewone tekst"), 0);
    }

    #[test]
    fn empty_transcript() {
        assert_eq!(budget_transcript(&[], 100, 0.3, 0.3), "");
    }
}
