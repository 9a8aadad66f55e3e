use super::{
    is_all_digits, line_texts, parse_count_amount_pair, parse_count_count_pair, MONTHLY_PHRASE,
};
use crate::extraction::Line;
use crate::{ExtractOptions, Record};
use regex::Regex;
use serde_json::{json, Map, Value};
use std::sync::LazyLock;

// label substring, nested record key, flat count key, flat total key
const CATEGORIES: [(&str, &str, &str, &str); 5] = [
    (
        "revolving accounts",
        "revolving_accounts_open",
        "revolving_open_count",
        "revolving_open_total",
    ),
    (
        "installment accounts",
        "installment_accounts_open",
        "installment_open_count",
        "installment_open_total",
    ),
    (
        "real estate",
        "real_estate_open",
        "real_estate_open_count",
        "real_estate_open_total",
    ),
    (
        "line of credit",
        "line_of_credit_accounts_open",
        "line_of_credit_accounts_open_count",
        "line_of_credit_accounts_open_total",
    ),
    (
        "miscellaneous",
        "miscellaneous_accounts_open",
        "miscellaneous_accounts_open_count",
        "miscellaneous_accounts_open_total",
    ),
];

static NO_ACCOUNTS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)no .*accounts").unwrap());

static PAIR_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\s*/\s*\$?\s*[0-9,]+").unwrap());

/// Account-category tables: "no ... accounts" phrasing means (0, 0); a
/// `count / $amount` pair may sit on the label line or within the next 7
/// lines. A category with no pair stays absent, never defaulted to 0.
pub fn locate_account_categories(lines: &[Line], rec: &mut Record) {
    let texts = line_texts(lines);

    for (i, t) in texts.iter().enumerate() {
        let low = t.to_lowercase();
        for (label, nested_key, count_key, total_key) in CATEGORIES {
            if !low.contains(label) {
                continue;
            }

            let mut pair: Option<(i64, i64)> = None;
            if NO_ACCOUNTS.is_match(&low) {
                pair = Some((0, 0));
            } else if !MONTHLY_PHRASE.is_match(&low) {
                pair = PAIR_SHAPE
                    .find(&low)
                    .and_then(|m| parse_count_amount_pair(m.as_str()));
            }
            if pair.is_none() {
                for nxt in texts.iter().skip(i + 1).take(7) {
                    let nlow = nxt.to_lowercase();
                    if NO_ACCOUNTS.is_match(&nlow) {
                        pair = Some((0, 0));
                        break;
                    }
                    if MONTHLY_PHRASE.is_match(&nlow) {
                        continue;
                    }
                    if let Some(m) = PAIR_SHAPE.find(&nlow) {
                        pair = parse_count_amount_pair(m.as_str());
                        break;
                    }
                }
            }

            if let Some((count, total)) = pair {
                rec.insert(nested_key.into(), json!({"count": count, "amount": total}));
                rec.insert(count_key.into(), json!(count));
                rec.insert(total_key.into(), json!(total));
            }
            break;
        }
    }
}

/// Collections open/closed: an `n / m` pair within the next 5 lines, else
/// the next two standalone all-digit lines. Absent when neither matches.
pub fn locate_collections(lines: &[Line], rec: &mut Record) {
    let texts = line_texts(lines);

    for (i, t) in texts.iter().enumerate() {
        if !t.to_lowercase().contains("collections") {
            continue;
        }
        let window = texts.iter().skip(i + 1).take(5);
        let mut found = false;
        for nxt in window.clone() {
            if let Some((open, closed)) = parse_count_count_pair(nxt) {
                rec.insert("collections".into(), json!({"open": open, "closed": closed}));
                rec.insert("collections_open".into(), json!(open));
                rec.insert("collections_closed".into(), json!(closed));
                found = true;
                break;
            }
        }
        if !found {
            let mut vals: Vec<i64> = Vec::new();
            for nxt in window {
                let s = nxt.trim();
                if is_all_digits(s) {
                    if let Ok(v) = s.parse() {
                        vals.push(v);
                    }
                }
                if vals.len() >= 2 {
                    break;
                }
            }
            if !vals.is_empty() {
                let open = json!(vals[0]);
                let closed = vals.get(1).map_or(Value::Null, |v| json!(v));
                rec.insert(
                    "collections".into(),
                    json!({"open": open.clone(), "closed": closed.clone()}),
                );
                rec.insert("collections_open".into(), open);
                rec.insert("collections_closed".into(), closed);
            }
        }
    }
}

static INQUIRY_COUNT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)(\d+)\s+inq").unwrap());

static LAST_6_MONTHS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)last\s*6\s*months").unwrap());

/// Inquiry counts near an "inquir..." heading, accumulated over the next 19
/// lines. Every `N inq` match is counted, whether or not a 6-month window
/// is spelled out nearby; unlabeled windows are optimistically treated as
/// within 6 months. Stored under the canonical key and a legacy alias.
pub fn locate_inquiries(lines: &[Line], rec: &mut Record) {
    let texts = line_texts(lines);

    for (i, t) in texts.iter().enumerate() {
        if !t.to_lowercase().contains("inquir") {
            continue;
        }
        let mut total: i64 = 0;
        let mut found_any = false;
        for nxt in texts.iter().skip(i + 1).take(19) {
            if let Some(caps) = INQUIRY_COUNT.captures(nxt) {
                if let Ok(n) = caps[1].parse::<i64>() {
                    total += n;
                    found_any = true;
                }
            }
        }
        if found_any || LAST_6_MONTHS.is_match(t) {
            rec.insert("inquiries_last_6_months".into(), json!(total));
            rec.insert("inquiries_6mo".into(), json!(total));
        }
    }
}

static LATE_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s+(?:\w+\s+)*late[s]?\s+.*\bin\b\s*(\d+)(?:\s*-\s*(\d+))?\s*(mo|yr|yrs)?")
        .unwrap()
});

static LATE_FALLBACK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)lates\s*\+2yr\s*:\s*(\d+)").unwrap());

static MO_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bmo\b").unwrap());

/// Late-payment buckets near a "Late Pays" heading.
///
/// Lines like "2 Rev Lates in 4-6 mo" land in the within-2-years bucket;
/// year-denominated entries land in the beyond-2-years bucket. The
/// `Lates +2yr: N` fallback only contributes while the year bucket is
/// still zero.
pub fn locate_late_pays(lines: &[Line], rec: &mut Record) {
    let texts = line_texts(lines);

    for (i, t) in texts.iter().enumerate() {
        let low = t.to_lowercase();
        if !low.contains("late pay") && !low.contains("lates +2yr") {
            continue;
        }
        let mut lt2yr: i64 = 0;
        let mut gt2yr: i64 = 0;
        for nxt in texts.iter().skip(i + 1).take(19) {
            if let Some(caps) = LATE_ENTRY.captures(nxt) {
                let Ok(n) = caps[1].parse::<i64>() else { continue };
                let unit = caps.get(4).map_or(String::new(), |m| m.as_str().to_lowercase());
                if unit.contains("mo") || MO_WORD.is_match(nxt) {
                    lt2yr += n;
                } else {
                    gt2yr += n;
                }
                continue;
            }
            if let Some(caps) = LATE_FALLBACK.captures(nxt) {
                if gt2yr == 0 {
                    if let Ok(n) = caps[1].parse::<i64>() {
                        gt2yr += n;
                    }
                }
            }
        }
        if lt2yr != 0 || gt2yr != 0 {
            rec.insert(
                "late_pays".into(),
                json!({"last_2_years": lt2yr, "last_over_2_years": gt2yr}),
            );
            rec.insert("late_pays_gt2yr".into(), json!(gt2yr));
        }
    }
}

static DOLLAR_DIGIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\d").unwrap());

static DOLLAR_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\s*([0-9,]+)").unwrap());

static PERCENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)%").unwrap());

/// Credit-card open totals: up to 5 `$`-amount lines after the heading,
/// parsed positionally (balance, limit[+percent], payment). When no numeric
/// value is extracted at all the field is an explicit null, not an empty
/// object. Color detection runs after amount collection.
pub fn locate_credit_card_totals(lines: &[Line], opts: &ExtractOptions, rec: &mut Record) {
    let texts = line_texts(lines);

    let Some(idx) = texts
        .iter()
        .position(|t| t.to_lowercase().contains("credit card open totals"))
    else {
        return;
    };

    let amounts: Vec<&str> = texts
        .iter()
        .skip(idx + 1)
        .take(5)
        .filter(|t| {
            let s = t.trim();
            s.starts_with('$') || DOLLAR_DIGIT.is_match(s)
        })
        .map(String::as_str)
        .collect();

    let mut parsed = Map::new();
    if let Some(first) = amounts.first() {
        parsed.insert("balance".into(), dollar_int(first));
    }
    if let Some(second) = amounts.get(1) {
        if let Some(caps) = PERCENT.captures(second) {
            if let Ok(p) = caps[1].parse::<i64>() {
                parsed.insert("Percent".into(), json!(p));
            }
        }
        parsed.insert("limit".into(), dollar_int(second));
    }
    if let Some(third) = amounts.get(2) {
        parsed.insert("Payment".into(), dollar_int(third));
    }

    if parsed.values().any(|v| !v.is_null()) {
        rec.insert("credit_card_open_totals".into(), Value::Object(parsed));
    } else {
        rec.insert("credit_card_open_totals".into(), Value::Null);
    }

    if opts.include_spans {
        attach_totals_color(lines, idx, rec);
    }
}

/// Prefer a span carrying the monetary token, else any colored span, within
/// the amount window.
fn attach_totals_color(lines: &[Line], idx: usize, rec: &mut Record) {
    for line in lines.iter().skip(idx + 1).take(5) {
        let preferred = line
            .spans
            .iter()
            .find(|s| s.text.contains('$') || DOLLAR_DIGIT.is_match(&s.text))
            .or_else(|| line.spans.iter().find(|s| s.has_color()));
        let Some(span) = preferred else { continue };
        let Some(rgb) = span.color() else { continue };
        rec.insert(
            "credit_card_open_totals_color".into(),
            json!(rgb.category().as_str()),
        );
        rec.insert("credit_card_open_totals_bbox".into(), json!(line.bbox));
        rec.insert("credit_card_open_totals_page".into(), json!(line.page));
        rec.insert(
            "credit_card_open_totals_spans".into(),
            serde_json::to_value(&line.spans).unwrap_or_default(),
        );
        break;
    }
}

fn dollar_int(s: &str) -> Value {
    DOLLAR_AMOUNT
        .captures(s)
        .and_then(|caps| caps[1].replace(',', "").parse::<i64>().ok())
        .map_or(Value::Null, |v| json!(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{colored_line, plain_lines};

    fn rec_for(texts: &[&str], f: impl Fn(&[Line], &mut Record)) -> Record {
        let lines = plain_lines(texts);
        let mut rec = Record::new();
        f(&lines, &mut rec);
        rec
    }

    #[test]
    fn test_no_accounts_phrasing_yields_zero_pair() {
        let rec = rec_for(&["No Revolving Accounts"], locate_account_categories);
        assert_eq!(rec.get("revolving_open_count"), Some(&json!(0)));
        assert_eq!(rec.get("revolving_open_total"), Some(&json!(0)));
        assert_eq!(
            rec.get("revolving_accounts_open"),
            Some(&json!({"count": 0, "amount": 0}))
        );
    }

    #[test]
    fn test_pair_on_label_line() {
        let rec = rec_for(&["Revolving Accounts 3 / $4,500"], locate_account_categories);
        assert_eq!(rec.get("revolving_open_count"), Some(&json!(3)));
        assert_eq!(rec.get("revolving_open_total"), Some(&json!(4500)));
    }

    #[test]
    fn test_pair_in_lookahead_window() {
        let rec = rec_for(
            &["Installment Accounts", "open", "2 / $31,000"],
            locate_account_categories,
        );
        assert_eq!(rec.get("installment_open_count"), Some(&json!(2)));
        assert_eq!(rec.get("installment_open_total"), Some(&json!(31000)));
    }

    #[test]
    fn test_no_accounts_in_lookahead() {
        let rec = rec_for(
            &["Line of Credit", "No Line of Credit Accounts"],
            locate_account_categories,
        );
        assert_eq!(
            rec.get("line_of_credit_accounts_open_count"),
            Some(&json!(0))
        );
        assert_eq!(
            rec.get("line_of_credit_accounts_open_total"),
            Some(&json!(0))
        );
    }

    #[test]
    fn test_category_absent_without_pair() {
        let rec = rec_for(
            &["Real Estate", "nothing useful follows"],
            locate_account_categories,
        );
        assert!(!rec.contains_key("real_estate_open_count"));
        assert!(!rec.contains_key("real_estate_open"));
    }

    #[test]
    fn test_monthly_phrasing_not_a_pair() {
        let rec = rec_for(
            &["Revolving Accounts 3 / $25 per month"],
            locate_account_categories,
        );
        assert!(!rec.contains_key("revolving_open_count"));
    }

    #[test]
    fn test_lookahead_stops_after_seven_lines() {
        let rec = rec_for(
            &["Miscellaneous", "a", "b", "c", "d", "e", "f", "g", "1 / $100"],
            locate_account_categories,
        );
        assert!(!rec.contains_key("miscellaneous_accounts_open_count"));
    }

    #[test]
    fn test_collections_pair() {
        let rec = rec_for(&["Collections (Open/Closed)", "2 / 5"], locate_collections);
        assert_eq!(rec.get("collections_open"), Some(&json!(2)));
        assert_eq!(rec.get("collections_closed"), Some(&json!(5)));
        assert_eq!(
            rec.get("collections"),
            Some(&json!({"open": 2, "closed": 5}))
        );
    }

    #[test]
    fn test_collections_standalone_digit_fallback() {
        let rec = rec_for(&["Collections", "Open", "1", "Closed", "4"], locate_collections);
        assert_eq!(rec.get("collections_open"), Some(&json!(1)));
        assert_eq!(rec.get("collections_closed"), Some(&json!(4)));
    }

    #[test]
    fn test_collections_absent_when_nothing_matches() {
        let rec = rec_for(&["Collections", "none reported"], locate_collections);
        assert!(!rec.contains_key("collections_open"));
        assert!(!rec.contains_key("collections"));
    }

    #[test]
    fn test_inquiries_accumulate() {
        let rec = rec_for(
            &["Inquires", "2 Inq in 0-6 mo", "1 Inq in 6-12 mo"],
            locate_inquiries,
        );
        // greedy policy: both windows counted
        assert_eq!(rec.get("inquiries_last_6_months"), Some(&json!(3)));
        assert_eq!(rec.get("inquiries_6mo"), Some(&json!(3)));
    }

    #[test]
    fn test_inquiries_unlabeled_window_still_counted() {
        let rec = rec_for(&["Inquiries", "4 Inq"], locate_inquiries);
        assert_eq!(rec.get("inquiries_last_6_months"), Some(&json!(4)));
    }

    #[test]
    fn test_inquiries_absent_without_counts() {
        let rec = rec_for(&["Inquiries", "none"], locate_inquiries);
        assert!(!rec.contains_key("inquiries_last_6_months"));
    }

    #[test]
    fn test_late_pays_month_range_goes_lt2yr() {
        let rec = rec_for(&["Late Pays", "2 Rev Lates in 4-6 mo"], locate_late_pays);
        assert_eq!(
            rec.get("late_pays"),
            Some(&json!({"last_2_years": 2, "last_over_2_years": 0}))
        );
        assert_eq!(rec.get("late_pays_gt2yr"), Some(&json!(0)));
    }

    #[test]
    fn test_late_pays_year_range_goes_gt2yr() {
        let rec = rec_for(&["Late Pays", "40 RE Lates in 2-4 yrs"], locate_late_pays);
        assert_eq!(
            rec.get("late_pays"),
            Some(&json!({"last_2_years": 0, "last_over_2_years": 40}))
        );
        assert_eq!(rec.get("late_pays_gt2yr"), Some(&json!(40)));
    }

    #[test]
    fn test_late_pays_fallback_only_when_year_bucket_zero() {
        let rec = rec_for(
            &["Late Pays", "3 RE Lates in 2-4 yrs", "Lates +2yr: 9"],
            locate_late_pays,
        );
        // fallback discarded: year bucket already nonzero
        assert_eq!(rec.get("late_pays_gt2yr"), Some(&json!(3)));

        let rec = rec_for(&["Late Pays", "Lates +2yr: 9"], locate_late_pays);
        assert_eq!(rec.get("late_pays_gt2yr"), Some(&json!(9)));
    }

    #[test]
    fn test_late_pays_absent_when_both_zero() {
        let rec = rec_for(&["Late Pays", "no lates reported"], locate_late_pays);
        assert!(!rec.contains_key("late_pays"));
        assert!(!rec.contains_key("late_pays_gt2yr"));
    }

    #[test]
    fn test_credit_card_totals_positional_parse() {
        let rec = rec_for(
            &["Credit Card Open Totals", "$20,483", "$17,650 116%", "$549"],
            |l, r| locate_credit_card_totals(l, &ExtractOptions::default(), r),
        );
        assert_eq!(
            rec.get("credit_card_open_totals"),
            Some(&json!({"balance": 20483, "Percent": 116, "limit": 17650, "Payment": 549}))
        );
    }

    #[test]
    fn test_credit_card_totals_null_when_no_amounts() {
        let rec = rec_for(&["Credit Card Open Totals", "no data"], |l, r| {
            locate_credit_card_totals(l, &ExtractOptions::default(), r)
        });
        assert_eq!(rec.get("credit_card_open_totals"), Some(&Value::Null));
    }

    #[test]
    fn test_credit_card_totals_absent_without_heading() {
        let rec = rec_for(&["$20,483"], |l, r| {
            locate_credit_card_totals(l, &ExtractOptions::default(), r)
        });
        assert!(!rec.contains_key("credit_card_open_totals"));
    }

    #[test]
    fn test_credit_card_color_after_amounts() {
        let mut lines = plain_lines(&["Credit Card Open Totals"]);
        lines.push(colored_line("$20,483", 0xc81e1e));
        let o = ExtractOptions {
            include_spans: true,
            ..ExtractOptions::default()
        };
        let mut rec = Record::new();
        locate_credit_card_totals(&lines, &o, &mut rec);
        assert_eq!(
            rec.get("credit_card_open_totals"),
            Some(&json!({"balance": 20483}))
        );
        assert_eq!(rec.get("credit_card_open_totals_color"), Some(&json!("red")));
        assert!(rec.contains_key("credit_card_open_totals_bbox"));
    }
}
