use crate::extraction::Line;
use crate::{ExtractOptions, Record};
use regex::Regex;
use serde_json::{json, Map, Value};
use std::sync::LazyLock;

// Headings that end the factor list when encountered mid-scan
static SECTION_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)credit alerts|public records|categories|inquir|late pays|credit report")
        .unwrap()
});

// Account-table rows that can trail the factor list without a blank line
const TABLE_HEADERS: [&str; 11] = [
    "open accounts",
    "revolving accounts",
    "line of credit accounts",
    "real estate accounts",
    "installment accounts",
    "miscellaneous accounts",
    "closed accounts",
    "no line of credit accounts",
    "no real estate accounts",
    "no installment accounts",
    "no miscellaneous accounts",
];

static COLOR_WORD_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*\b(red|green|black|neutral|amber)\b\s*$").unwrap());

const FACTOR_SCAN_LIMIT: usize = 120;

/// Credit-factor list under the "Credit Factors" heading.
///
/// Consumes lines until a blank line, a section heading, or an account-table
/// row. A trailing color word on a factor line is treated as a textual hint;
/// an actual span color always wins over the hint. The scan honors the
/// configured page limit since factor lists never run past the summary pages.
pub fn locate_credit_factors(lines: &[Line], opts: &ExtractOptions, rec: &mut Record) {
    let lines: Vec<&Line> = lines.iter().filter(|l| l.page < opts.page_limit).collect();
    let texts: Vec<String> = lines.iter().map(|l| l.text()).collect();

    let Some(idx) = texts
        .iter()
        .position(|t| t.to_lowercase().contains("credit factors"))
    else {
        return;
    };

    let mut factors: Vec<Value> = Vec::new();
    for (line, t) in lines.iter().zip(texts.iter()).skip(idx + 1).take(FACTOR_SCAN_LIMIT) {
        let trimmed = t.trim();
        if trimmed.is_empty() {
            break;
        }
        let low = trimmed.to_lowercase();
        if SECTION_BREAK.is_match(&low) || TABLE_HEADERS.contains(&low.as_str()) {
            break;
        }
        if trimmed == "#" {
            continue;
        }

        let mut factor_text = trimmed.to_string();
        let hint = COLOR_WORD_SUFFIX
            .find(&factor_text)
            .map(|m| (m.start(), m.as_str().trim().to_lowercase()));
        let text_hint = hint.map(|(start, word)| {
            factor_text.truncate(start);
            factor_text.truncate(factor_text.trim_end().len());
            word
        });

        let mut factor = Map::new();
        factor.insert("factor".into(), json!(factor_text));

        let span_rgb = line.spans.first().and_then(|s| s.color());
        if let Some(rgb) = span_rgb {
            factor.insert("hex".into(), json!(rgb.to_hex()));
            factor.insert("color".into(), json!(rgb.category().as_str()));
        } else if let Some(hint) = text_hint {
            factor.insert("color".into(), json!(hint));
        }

        if opts.include_spans {
            factor.insert("page".into(), json!(line.page));
            factor.insert("bbox".into(), json!(line.bbox));
            factor.insert(
                "spans".into(),
                serde_json::to_value(&line.spans).unwrap_or_default(),
            );
        }
        factors.push(Value::Object(factor));
    }

    if factors.is_empty() {
        return;
    }

    let count = |c: &str| {
        factors
            .iter()
            .filter(|f| f.get("color").and_then(Value::as_str) == Some(c))
            .count() as i64
    };
    let (red, green, black) = (count("red"), count("green"), count("black"));
    rec.insert("credit_factors".into(), Value::Array(factors));
    rec.insert("red_credit_factors_count".into(), json!(red));
    rec.insert("green_credit_factors_count".into(), json!(green));
    rec.insert("black_credit_factors_count".into(), json!(black));
}

/// Heuristic relevance score for a factor entry.
fn candidate_score(factor: &Value) -> i64 {
    let text = factor
        .get("factor")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let mut score = 0;
    if text.len() < 40 {
        score += 2;
    }
    if text.chars().any(|c| c.is_ascii_digit()) {
        score += 1;
    }
    if text.to_lowercase().contains("paid") {
        score += 1;
    }
    if factor.get("hex").is_some() || factor.get("color").is_some() {
        score += 3;
    }
    score
}

/// Attach a `candidate_scores` list scoring each extracted factor. The list
/// is always present when requested, empty when no factors were found.
pub fn attach_candidate_scores(rec: &mut Record) {
    let scores: Vec<Value> = rec
        .get("credit_factors")
        .and_then(Value::as_array)
        .map(|factors| {
            factors
                .iter()
                .map(|f| {
                    json!({
                        "factor": f.get("factor").cloned().unwrap_or(Value::Null),
                        "score": candidate_score(f),
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    rec.insert("candidate_scores".into(), Value::Array(scores));
}

/// Sort factor entries by reading order: page first, then vertical position.
/// Entries without position data sort last.
pub fn sort_factors_by_position(factors: &mut [Value]) {
    factors.sort_by_key(|f| {
        let page = f.get("page").and_then(Value::as_i64).unwrap_or(9999);
        let top = f
            .get("bbox")
            .and_then(Value::as_array)
            .and_then(|b| b.get(1))
            .and_then(Value::as_i64)
            .unwrap_or(9999);
        (page, top)
    });
}
