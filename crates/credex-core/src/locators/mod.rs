pub mod accounts;
pub mod factors;
pub mod fields;

use crate::extraction::Line;
use crate::{ExtractOptions, Record};
use regex::Regex;
use std::sync::LazyLock;

/// Run every field locator over the shared line sequence.
///
/// Locators are independent scanners accumulating into one record; the only
/// documented ordering constraint is internal to the credit-card locator
/// (color detection after amount detection).
pub fn run_all(lines: &[Line], opts: &ExtractOptions, rec: &mut Record) {
    fields::locate_age(lines, rec);
    fields::locate_addresses(lines, rec);
    fields::locate_credit_score(lines, opts, rec);
    fields::locate_monthly_payments(lines, opts, rec);
    fields::locate_boolean_indicators(lines, opts, rec);
    fields::locate_public_records(lines, rec);
    accounts::locate_account_categories(lines, rec);
    accounts::locate_collections(lines, rec);
    accounts::locate_inquiries(lines, rec);
    accounts::locate_late_pays(lines, rec);
    accounts::locate_credit_card_totals(lines, opts, rec);
    factors::locate_credit_factors(lines, opts, rec);
    if opts.include_candidate_scores {
        factors::attach_candidate_scores(rec);
    }
    log::debug!("extracted {} field(s)", rec.len());
}

pub(crate) fn line_texts(lines: &[Line]) -> Vec<String> {
    lines.iter().map(|l| l.text()).collect()
}

// Monthly-payment phrasing, excluded from count/amount pair parsing
static MONTHLY_PHRASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bmo\b|/mo|per month").unwrap());

static BOOL_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(yes|no|y|n|true|false|1|0)\b").unwrap());

static COUNT_COUNT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s*/\s*(\d+)").unwrap());

/// Parse a `count / $amount` pair. Both sides must carry digits: a category
/// is either fully known or not set at all.
pub(crate) fn parse_count_amount_pair(s: &str) -> Option<(i64, i64)> {
    let s = s.trim();
    if MONTHLY_PHRASE.is_match(s) {
        return None;
    }
    let (left, right) = s.split_once('/')?;
    let count = digits_of(left)?;
    let amount = digits_of(right)?;
    Some((count, amount))
}

/// Parse `n / m` where both sides are plain integers (collections open/closed).
pub(crate) fn parse_count_count_pair(s: &str) -> Option<(i64, i64)> {
    let caps = COUNT_COUNT.captures(s)?;
    let a = caps[1].parse().ok()?;
    let b = caps[2].parse().ok()?;
    Some((a, b))
}

/// Interpret a yes/no-style token as 1 or 0.
///
/// An exact trimmed token is preferred; otherwise the first recognizable
/// word in the text wins.
pub(crate) fn parse_bool_token(t: &str) -> Option<i64> {
    let s = t.trim().to_lowercase();
    match s.as_str() {
        "yes" | "y" | "true" | "t" | "1" => return Some(1),
        "no" | "n" | "false" | "f" | "0" => return Some(0),
        _ => {}
    }
    let caps = BOOL_TOKEN.captures(&s)?;
    let token = caps.get(1)?.as_str();
    Some(match token {
        "yes" | "y" | "true" | "1" => 1,
        _ => 0,
    })
}

/// Concatenated digits of a string, if any.
pub(crate) fn digits_of(s: &str) -> Option<i64> {
    let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        None
    } else {
        digits.parse().ok()
    }
}

pub(crate) fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}
