use super::{is_all_digits, line_texts, parse_bool_token};
use crate::color::Rgb;
use crate::extraction::{Line, Span};
use crate::normalize::normalize_address;
use crate::{ExtractOptions, Record};
use regex::Regex;
use serde_json::{json, Value};
use std::sync::LazyLock;

static AGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)age[:\s]*([0-9]{1,3})").unwrap());

/// First line matching `Age: NN` wins.
pub fn locate_age(lines: &[Line], rec: &mut Record) {
    for line in lines {
        if let Some(caps) = AGE.captures(&line.text()) {
            if let Ok(v) = caps[1].parse::<i64>() {
                rec.insert("age".into(), json!(v));
            }
            break;
        }
    }
}

static STREET_LIKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\d+|\b(st|rd|dr|ln|ave|blvd|way|ct|circle|ste|suite)\b").unwrap()
});

static CITY_LIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Za-z][A-Za-z\.\s]+,\s*[A-Z]{2}\.?\s*\d{5}\b").unwrap());

static ADDRESS_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"credit|age|name|report date|categories").unwrap());

/// Detect contiguous street-like runs followed by city-like runs and pair
/// them in order. Results are normalized and de-duplicated, first seen wins.
pub fn locate_addresses(lines: &[Line], rec: &mut Record) {
    let texts = line_texts(lines);
    let mut addresses: Vec<String> = Vec::new();

    let mut i = 0;
    while i < texts.len() {
        let mut streets: Vec<String> = Vec::new();
        while i < texts.len() && STREET_LIKE.is_match(&texts[i]) && !CITY_LIKE.is_match(&texts[i]) {
            let t = texts[i].trim();
            if !t.is_empty() && !ADDRESS_NOISE.is_match(&t.to_lowercase()) {
                streets.push(t.to_string());
            }
            i += 1;
        }
        let mut cities: Vec<String> = Vec::new();
        let mut j = i;
        while j < texts.len() && CITY_LIKE.is_match(&texts[j]) {
            cities.push(texts[j].trim().to_string());
            j += 1;
        }
        if !streets.is_empty() && !cities.is_empty() {
            for k in 0..streets.len().min(cities.len()) {
                addresses.push(format!("{}, {}", streets[k], cities[k]));
            }
            i = j;
        } else {
            i += 1;
        }
    }

    if addresses.is_empty() {
        return;
    }
    let mut seen: Vec<String> = Vec::new();
    for a in &addresses {
        let na = normalize_address(a);
        if !seen.contains(&na) {
            seen.push(na);
        }
    }
    rec.insert("address".into(), json!(seen));
}

/// Search a +/-3 line window around any "credit score" label for a purely
/// numeric line; fall back to a standalone 300..850 number in the first 6
/// lines of the document.
pub fn locate_credit_score(lines: &[Line], opts: &ExtractOptions, rec: &mut Record) {
    let texts = line_texts(lines);

    'label: for idx in 0..texts.len() {
        if !texts[idx].to_lowercase().contains("credit score") {
            continue;
        }
        for j in idx.saturating_sub(3)..=(idx + 3).min(texts.len().saturating_sub(1)) {
            let t = texts[j].trim();
            if !is_all_digits(t) {
                continue;
            }
            if let Ok(v) = t.parse::<i64>() {
                rec.insert("credit_score".into(), json!(v));
                if opts.include_spans {
                    attach_score_color_window(lines, j, t, rec);
                }
            }
            break 'label;
        }
    }

    if rec.get("credit_score").is_some_and(|v| !v.is_null()) {
        return;
    }

    // Fallback: standalone plausible score near the top of the document
    for line in lines.iter().take(6) {
        let t = line.text();
        let t = t.trim();
        if !is_all_digits(t) {
            continue;
        }
        let Ok(v) = t.parse::<i64>() else { continue };
        if !(300..=850).contains(&v) {
            continue;
        }
        rec.insert("credit_score".into(), json!(v));
        if opts.include_spans {
            if let Some(span) = preferred_span(line, t) {
                if let Some(cat) = span.color().map(Rgb::category) {
                    rec.insert("credit_score_color".into(), json!(cat.as_str()));
                    attach_position(rec, "credit_score", line);
                }
            }
        }
        break;
    }
}

/// Look +/-2 lines around the matched numeric line for a span carrying the
/// digits (preferred) or any color metadata, and classify it.
fn attach_score_color_window(lines: &[Line], j: usize, digits: &str, rec: &mut Record) {
    for k in j.saturating_sub(2)..=(j + 2).min(lines.len().saturating_sub(1)) {
        let line = &lines[k];
        let Some(span) = preferred_span(line, digits) else {
            continue;
        };
        if let Some(cat) = span.color().map(Rgb::category) {
            rec.insert("credit_score_color".into(), json!(cat.as_str()));
            attach_position(rec, "credit_score", line);
            break;
        }
    }
}

/// Span whose text contains `needle`, else any span with color metadata.
fn preferred_span<'a>(line: &'a Line, needle: &str) -> Option<&'a Span> {
    line.spans
        .iter()
        .find(|s| s.text.contains(needle))
        .or_else(|| line.spans.iter().find(|s| s.has_color()))
}

/// Record positional metadata (`_bbox`/`_page`/`_spans`) for a field.
fn attach_position(rec: &mut Record, key: &str, line: &Line) {
    rec.insert(format!("{key}_bbox"), json!(line.bbox));
    rec.insert(format!("{key}_page"), json!(line.page));
    rec.insert(
        format!("{key}_spans"),
        serde_json::to_value(&line.spans).unwrap_or_default(),
    );
}

static MONTHLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\$\s*([0-9,]+)\s*/?\s*mo").unwrap());

/// `$N/mo` amount, first match wins, commas stripped.
pub fn locate_monthly_payments(lines: &[Line], opts: &ExtractOptions, rec: &mut Record) {
    if opts.include_spans {
        // Color pass: the first "/mo" line yields a raw hex color and bbox
        if let Some(line) = lines
            .iter()
            .find(|l| l.spans.first().is_some_and(|s| s.text.contains("/mo")))
        {
            let preferred = line
                .spans
                .iter()
                .find(|s| s.text.contains("/mo") || s.text.contains('$'))
                .or_else(|| line.spans.first());
            if let Some(span) = preferred {
                if let Some(hex) = &span.hex {
                    rec.insert("monthly_payments_color".into(), json!(hex));
                } else if let Some([r, g, b]) = span.rgb {
                    rec.insert("monthly_payments_color".into(), json!(Rgb::new(r, g, b).to_hex()));
                }
                rec.insert("monthly_payments_bbox".into(), json!(line.bbox));
            }
        }
    } else if !rec.contains_key("monthly_payments_color") {
        // No spans requested: seed the color key as null, never raw data
        rec.insert("monthly_payments_color".into(), Value::Null);
    }

    if rec.contains_key("monthly_payments") {
        return;
    }
    for line in lines {
        let text = line.text();
        let Some(caps) = MONTHLY.captures(&text) else {
            continue;
        };
        if let Ok(v) = caps[1].replace(',', "").parse::<i64>() {
            rec.insert("monthly_payments".into(), json!(v));
            if opts.include_spans {
                if let Some(hex) = lines_first_hex(line) {
                    rec.insert("monthly_payments_color".into(), json!(hex));
                    rec.insert("monthly_payments_bbox".into(), json!(line.bbox));
                }
            }
        }
        break;
    }
}

fn lines_first_hex(line: &Line) -> Option<String> {
    line.spans.first().and_then(|s| s.hex.clone())
}

const BOOL_HEADINGS: [(&str, &str); 3] = [
    ("credit freeze", "credit_freeze"),
    ("fraud alert", "fraud_alert"),
    ("deceased", "deceased"),
];

/// Boolean indicators: value token on the same line, in the next 3 lines,
/// or (fallback) in the preceding up to 6 lines, in that priority order.
pub fn locate_boolean_indicators(lines: &[Line], opts: &ExtractOptions, rec: &mut Record) {
    let texts = line_texts(lines);

    for (heading, key) in BOOL_HEADINGS {
        let mut found: Option<(i64, usize)> = None;

        for i in 0..texts.len() {
            if !texts[i].to_lowercase().contains(heading) {
                continue;
            }
            if let Some(v) = parse_bool_token(&texts[i]) {
                found = Some((v, i));
                break;
            }
            for j in i + 1..(i + 4).min(texts.len()) {
                if let Some(v) = parse_bool_token(&texts[j]) {
                    found = Some((v, j));
                    break;
                }
            }
            if found.is_some() {
                break;
            }
            // Compact layouts may put the value above the heading
            for j in (i.saturating_sub(6)..i).rev() {
                if let Some(v) = parse_bool_token(&texts[j]) {
                    found = Some((v, j));
                    break;
                }
            }
            if found.is_some() {
                break;
            }
        }

        let Some((value, center)) = found else {
            continue;
        };
        rec.insert(key.into(), json!(value));
        if opts.include_spans {
            attach_indicator_spans(lines, center, key, rec);
        }
    }
}

static BOOL_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(yes|no|y|n|1|0|true|false)\b").unwrap());

/// Attach the vertically nearest line within +/-4 lines of the value, then
/// classify the span most likely to carry the indicator.
fn attach_indicator_spans(lines: &[Line], center: usize, key: &str, rec: &mut Record) {
    let head_mid = bbox_mid_y(&lines[center]);
    let mut best: Option<(&Line, f64)> = None;
    for j in center.saturating_sub(4)..=(center + 4).min(lines.len().saturating_sub(1)) {
        let dy = (head_mid - bbox_mid_y(&lines[j])).abs();
        if best.is_none_or(|(_, d)| dy < d) {
            best = Some((&lines[j], dy));
        }
    }
    let Some((line, _)) = best else { return };

    rec.insert(format!("{key}_bbox"), json!(line.bbox));
    rec.insert(format!("{key}_page"), json!(line.page));
    rec.insert(
        format!("{key}_spans"),
        serde_json::to_value(&line.spans).unwrap_or_default(),
    );

    let preferred = line
        .spans
        .iter()
        .find(|s| BOOL_WORD.is_match(s.text.trim()))
        .or_else(|| line.spans.iter().find(|s| s.has_color()));
    if let Some(cat) = preferred.and_then(|s| s.color()).map(Rgb::category) {
        rec.insert(format!("{key}_color"), json!(cat.as_str()));
    }
}

fn bbox_mid_y(line: &Line) -> f64 {
    (line.bbox[1] + line.bbox[3]) as f64 / 2.0
}

static PUBLIC_RECORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)public records[:\s]*(\d+)").unwrap());

/// Public records count: value on the label line or the first all-digit
/// line within the next 3 lines. Absent when not found.
pub fn locate_public_records(lines: &[Line], rec: &mut Record) {
    let texts = line_texts(lines);
    for (i, t) in texts.iter().enumerate() {
        if !t.to_lowercase().contains("public records") {
            continue;
        }
        if let Some(caps) = PUBLIC_RECORDS.captures(t) {
            if let Ok(v) = caps[1].parse::<i64>() {
                rec.insert("public_records".into(), json!(v));
                return;
            }
        }
        for nxt in texts.iter().skip(i + 1).take(3) {
            let s = nxt.trim();
            if is_all_digits(s) {
                if let Ok(v) = s.parse::<i64>() {
                    rec.insert("public_records".into(), json!(v));
                }
                return;
            }
        }
    }
}
