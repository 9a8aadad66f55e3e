use credex_core::canonical::canonicalize;
use credex_core::extraction::{DocumentSource, JsonDumpSource, RawPage};
use credex_core::{extract_fields, ExtractOptions};
use serde_json::json;

/// Build a one-page dump where every text becomes its own line; entries
/// may carry a packed span color.
fn dump(entries: &[(&str, Option<u32>)]) -> JsonDumpSource {
    let lines: Vec<serde_json::Value> = entries
        .iter()
        .enumerate()
        .map(|(i, (text, color))| {
            let mut span = json!({"text": text});
            if let Some(c) = color {
                span["color"] = json!(c);
            }
            json!({
                "bbox": [10.0, (i as f64) * 20.0, 400.0, (i as f64) * 20.0 + 12.0],
                "spans": [span]
            })
        })
        .collect();
    let page = json!({"blocks": [{"lines": lines}]});
    JsonDumpSource::from_str(&json!({"pages": [page]}).to_string()).unwrap()
}

#[test]
fn test_summary_page_end_to_end() {
    let source = dump(&[
        ("Credit Report", None),
        ("Age: 49", None),
        ("Credit Score", None),
        ("680", Some(0xc81e1e)),
        ("Credit Factors", None),
        ("Balances too high", Some(0xc81e1e)),
        ("Paid off 2 accounts", Some(0x1ec81e)),
        ("", None),
        ("Revolving Accounts", None),
        ("3 / $4,500", None),
        ("Late Pays", None),
        ("2 Rev Lates in 4-6 mo", None),
        ("40 RE Lates in 2-4 yrs", None),
    ]);

    let rec = extract_fields(&source, &ExtractOptions::default());

    assert_eq!(rec.get("age"), Some(&json!(49)));
    assert_eq!(rec.get("credit_score"), Some(&json!(680)));
    assert_eq!(rec.get("revolving_open_count"), Some(&json!(3)));
    assert_eq!(rec.get("revolving_open_total"), Some(&json!(4500)));
    assert_eq!(
        rec.get("late_pays"),
        Some(&json!({"last_2_years": 2, "last_over_2_years": 40}))
    );

    let factors = rec.get("credit_factors").unwrap().as_array().unwrap();
    assert_eq!(factors.len(), 2);
    assert_eq!(factors[0]["color"], json!("red"));
    assert_eq!(factors[1]["color"], json!("green"));
    assert_eq!(rec.get("red_credit_factors_count"), Some(&json!(1)));
    assert_eq!(rec.get("green_credit_factors_count"), Some(&json!(1)));

    // spans are opt-in
    assert!(rec.keys().all(|k| !k.ends_with("_bbox")
        && !k.ends_with("_page")
        && !k.ends_with("_spans")));
}

#[test]
fn test_credit_card_totals_end_to_end() {
    let source = dump(&[
        ("Credit Card Open Totals", None),
        ("$20,483", None),
        ("$17,650 116%", None),
        ("$549", None),
    ]);
    let rec = extract_fields(&source, &ExtractOptions::default());
    assert_eq!(
        rec.get("credit_card_open_totals"),
        Some(&json!({"balance": 20483, "Percent": 116, "limit": 17650, "Payment": 549}))
    );
}

#[test]
fn test_include_spans_attaches_provenance() {
    let source = dump(&[("Credit Score", None), ("680", Some(0xc81e1e))]);
    let opts = ExtractOptions {
        include_spans: true,
        ..ExtractOptions::default()
    };
    let rec = extract_fields(&source, &opts);
    assert_eq!(rec.get("credit_score"), Some(&json!(680)));
    assert_eq!(rec.get("credit_score_color"), Some(&json!("red")));
    assert!(rec.contains_key("credit_score_bbox"));
    assert!(rec.contains_key("credit_score_page"));
    assert!(rec.contains_key("credit_score_spans"));
}

#[test]
fn test_extract_then_canonicalize() {
    let source = dump(&[
        ("3070 Lakecrest Cir", None),
        ("Lexington, KY. 40513", None),
        ("Age: 49", None),
        ("Inquiries", None),
        ("2 Inq in 0-6 mo", None),
        ("1 Inq in 6-12 mo", None),
        ("Late Pays", None),
        ("2 Rev Lates in 4-6 mo", None),
    ]);
    let rec = extract_fields(&source, &ExtractOptions::default());
    let canon = canonicalize(&rec, false);

    // the extracted address list survives canonicalization
    assert_eq!(
        canon.get("address"),
        Some(&json!(["3070 Lakecrest Cir, Lexington, KY 40513"]))
    );

    assert_eq!(canon.get("inquiries_last_6_months"), Some(&json!(3)));
    assert!(!canon.contains_key("inquiries_6mo"));
    assert_eq!(canon.get("late_pays_lt2yr"), Some(&json!(2)));
    assert_eq!(canon.get("late_pays_gt2yr"), Some(&json!(0)));
    assert!(!canon.contains_key("late_pays"));

    assert_eq!(canonicalize(&canon, false), canon);
}

struct BrokenSource;

impl DocumentSource for BrokenSource {
    fn pages(&self) -> Result<Vec<RawPage>, credex_core::error::CredexError> {
        Err(credex_core::error::CredexError::Source("boom".into()))
    }

    fn source_name(&self) -> &str {
        "broken"
    }
}

#[test]
fn test_broken_source_degrades_gracefully() {
    let rec = extract_fields(&BrokenSource, &ExtractOptions::default());
    // only the seeded null color marker, nothing located
    assert_eq!(rec.len(), 1);
    assert_eq!(
        rec.get("monthly_payments_color"),
        Some(&serde_json::Value::Null)
    );
}
