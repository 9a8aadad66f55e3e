//! Reduction of raw extraction records to a canonical, comparable shape.
//!
//! Raw records accumulate whatever each locator found, including nested
//! convenience objects and legacy aliases that older fixtures carry. The
//! canonical form is flat, uses one name per field, orders the account
//! columns deterministically, and is idempotent: canonicalizing a canonical
//! record returns it unchanged.

use crate::color::Rgb;
use crate::normalize::normalize_address;
use crate::Record;
use serde_json::{json, Map, Value};

// Flat column order for the account-category table
const ACCOUNT_SEQ: [&str; 10] = [
    "revolving_open_count",
    "revolving_open_total",
    "installment_open_count",
    "installment_open_total",
    "real_estate_open_count",
    "real_estate_open_total",
    "line_of_credit_accounts_open_count",
    "line_of_credit_accounts_open_total",
    "miscellaneous_accounts_open_count",
    "miscellaneous_accounts_open_total",
];

// nested key -> (flat count key, flat total key)
const NESTED_ACCOUNTS: [(&str, &str, &str); 5] = [
    ("revolving_accounts_open", "revolving_open_count", "revolving_open_total"),
    ("installment_accounts_open", "installment_open_count", "installment_open_total"),
    ("real_estate_open", "real_estate_open_count", "real_estate_open_total"),
    (
        "line_of_credit_accounts_open",
        "line_of_credit_accounts_open_count",
        "line_of_credit_accounts_open_total",
    ),
    (
        "miscellaneous_accounts_open",
        "miscellaneous_accounts_open_count",
        "miscellaneous_accounts_open_total",
    ),
];

const COLOR_WORDS: [&str; 5] = ["red", "green", "black", "neutral", "amber"];

fn is_positional_key(k: &str) -> bool {
    k.ends_with("_bbox") || k.ends_with("_page") || k.ends_with("_spans")
}

/// Reduce a raw record to its canonical shape.
///
/// Accepts either a bare record or the `{"rec": {...}}` wrapper some stored
/// fixtures use. With `include_spans` off the result carries no positional
/// keys at all.
pub fn canonicalize(raw: &Record, include_spans: bool) -> Record {
    let source = match raw.get("rec").and_then(Value::as_object) {
        Some(inner) => inner,
        None => raw,
    };

    let mut out = Record::new();
    for (k, v) in source {
        if is_positional_key(k) || k == "pdf_file" || k == "all_lines_obj" {
            continue;
        }
        match k.as_str() {
            "credit_score" => match v.as_object() {
                // older fixtures nest {value, color}
                Some(obj) => {
                    if let Some(value) = obj.get("value") {
                        out.insert("credit_score".into(), value.clone());
                    }
                    if let Some(color) = obj.get("color") {
                        out.entry("credit_score_color").or_insert(color.clone());
                    }
                }
                None => {
                    out.insert("credit_score".into(), v.clone());
                }
            },
            "inquiries_6mo" => {
                // legacy alias for the canonical key
                if !source.contains_key("inquiries_last_6_months") {
                    out.insert("inquiries_last_6_months".into(), v.clone());
                }
            }
            "late_pays" => {
                if let Some(obj) = v.as_object() {
                    let lt = obj.get("last_2_years").and_then(Value::as_i64).unwrap_or(0);
                    let gt = obj
                        .get("last_over_2_years")
                        .and_then(Value::as_i64)
                        .unwrap_or(0);
                    out.insert("late_pays_lt2yr".into(), json!(lt));
                    out.insert("late_pays_gt2yr".into(), json!(gt));
                }
            }
            "late_pays_gt2yr" => {
                out.insert("late_pays_gt2yr".into(), v.clone());
            }
            "collections" => {
                if let Some(obj) = v.as_object() {
                    out.insert(
                        "collections_open".into(),
                        obj.get("open").cloned().unwrap_or(Value::Null),
                    );
                    out.insert(
                        "collections_closed".into(),
                        obj.get("closed").cloned().unwrap_or(Value::Null),
                    );
                }
            }
            "credit_factors" => {
                let factors: Vec<Value> = v
                    .as_array()
                    .map(|fs| fs.iter().map(|f| canonical_factor(f, include_spans)).collect())
                    .unwrap_or_default();
                out.insert("credit_factors".into(), Value::Array(factors));
            }
            "address" => {
                // list of addresses; legacy fixtures store a bare string
                let addr = match v {
                    Value::Array(items) => Value::Array(
                        items
                            .iter()
                            .map(|a| match a.as_str() {
                                Some(s) => Value::String(normalize_address(s)),
                                None => a.clone(),
                            })
                            .collect(),
                    ),
                    Value::String(s) => Value::Array(vec![Value::String(normalize_address(s))]),
                    other => other.clone(),
                };
                out.insert("address".into(), addr);
            }
            _ => {
                if let Some((_, count_key, total_key)) =
                    NESTED_ACCOUNTS.iter().find(|(nested, _, _)| nested == k)
                {
                    if let Some(obj) = v.as_object() {
                        out.insert(
                            (*count_key).into(),
                            obj.get("count").cloned().unwrap_or(Value::Null),
                        );
                        out.insert(
                            (*total_key).into(),
                            obj.get("amount").cloned().unwrap_or(Value::Null),
                        );
                    }
                } else {
                    out.insert(k.clone(), v.clone());
                }
            }
        }
    }

    out.entry("late_pays_lt2yr").or_insert(json!(0));
    out.entry("late_pays_gt2yr").or_insert(json!(0));

    if out.contains_key("credit_factors") {
        recount_factor_colors(&mut out);
    }

    if include_spans {
        reattach_positions(source, &mut out);
    }

    reorder(out)
}

/// Normalize one factor entry.
///
/// Older fixtures sometimes store a color word in the `hex` slot; that word
/// becomes the color and the hex is dropped. An explicit color always wins
/// over one derived from the hex or from span data.
fn canonical_factor(f: &Value, include_spans: bool) -> Value {
    let Some(obj) = f.as_object() else {
        return json!({"factor": f.clone()});
    };

    let mut out = Map::new();
    out.insert(
        "factor".into(),
        obj.get("factor").cloned().unwrap_or(Value::Null),
    );

    let mut hex: Option<String> = None;
    let mut color: Option<String> = None;
    if let Some(h) = obj.get("hex").and_then(Value::as_str) {
        let low = h.to_lowercase();
        if COLOR_WORDS.contains(&low.as_str()) {
            color = Some(low);
        } else {
            hex = Some(low);
        }
    }
    if let Some(c) = obj.get("color").and_then(Value::as_str) {
        color = Some(c.to_lowercase());
    }
    if color.is_none() {
        if let Some(h) = &hex {
            color = Rgb::from_hex(h).map(|rgb| rgb.category().as_str().to_string());
        }
    }
    if color.is_none() && include_spans {
        color = obj
            .get("spans")
            .and_then(Value::as_array)
            .and_then(|spans| spans.iter().find_map(span_color))
            .map(|rgb| rgb.category().as_str().to_string());
    }

    if let Some(c) = color {
        out.insert("color".into(), json!(c));
    }
    if let Some(h) = hex {
        out.insert("hex".into(), json!(h));
    }
    if include_spans {
        for pk in ["page", "bbox", "spans", "canonical_key"] {
            if let Some(v) = obj.get(pk) {
                out.insert(pk.into(), v.clone());
            }
        }
    }
    Value::Object(out)
}

/// Span color from serialized span metadata, rgb first, then hex.
fn span_color(span: &Value) -> Option<Rgb> {
    if let Some(rgb) = span.get("rgb").and_then(Value::as_array) {
        let mut it = rgb.iter().filter_map(Value::as_u64);
        if let (Some(r), Some(g), Some(b)) = (it.next(), it.next(), it.next()) {
            return Some(Rgb::new(r as u8, g as u8, b as u8));
        }
    }
    span.get("hex")
        .and_then(Value::as_str)
        .and_then(Rgb::from_hex)
}

fn recount_factor_colors(out: &mut Record) {
    let count = |c: &str| {
        out.get("credit_factors")
            .and_then(Value::as_array)
            .map(|fs| {
                fs.iter()
                    .filter(|f| f.get("color").and_then(Value::as_str) == Some(c))
                    .count() as i64
            })
            .unwrap_or(0)
    };
    let (red, green, black) = (count("red"), count("green"), count("black"));
    out.insert("red_credit_factors_count".into(), json!(red));
    out.insert("green_credit_factors_count".into(), json!(green));
    out.insert("black_credit_factors_count".into(), json!(black));
}

/// Carry positional metadata over for every field the canonical record kept.
fn reattach_positions(source: &Record, out: &mut Record) {
    let kept: Vec<String> = out.keys().cloned().collect();
    for k in kept {
        for suffix in ["_bbox", "_page", "_spans"] {
            let pk = format!("{k}{suffix}");
            if let Some(v) = source.get(&pk) {
                out.insert(pk, v.clone());
            }
        }
    }
}

/// Deterministic key order: account columns first, then the late-pay
/// buckets, then everything else in first-seen order.
fn reorder(mut rec: Record) -> Record {
    let mut out = Record::new();
    for k in ACCOUNT_SEQ {
        if let Some(v) = rec.remove(k) {
            out.insert(k.into(), v);
        }
    }
    for k in ["late_pays_lt2yr", "late_pays_gt2yr"] {
        if let Some(v) = rec.remove(k) {
            out.insert(k.into(), v);
        }
    }
    for (k, v) in rec {
        out.insert(k, v);
    }
    out
}
