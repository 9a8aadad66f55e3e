use regex::Regex;
use std::sync::LazyLock;

static WS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

// "Street, City, ST ZIP" with optional trailing period after the state
static FULL_ADDR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<street>.*?),\s*(?P<city>[A-Za-z\s]+),?\s*(?P<state>[A-Za-z]{2})\.?\s*(?P<zip>\d{5})")
        .unwrap()
});

static COMMA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*,\s*").unwrap());

/// Normalize an address string into a deterministic form.
///
/// Examples:
/// - `3070 lakecrest cir, Lexington, KY. 40513` -> `3070 Lakecrest Cir, Lexington, KY 40513`
/// - `1208 LEMOND DR, MIDDLETOWN, DE. 19709` -> `1208 Lemond Dr, Middletown, DE 19709`
pub fn normalize_address(s: &str) -> String {
    let s0 = s.replace('.', "");
    let s0 = WS.replace_all(&s0, " ").trim().to_string();

    if let Some(caps) = FULL_ADDR.captures(&s0) {
        let street = caps.name("street").map_or("", |m| m.as_str()).trim();
        let city = caps.name("city").map_or("", |m| m.as_str()).trim();
        let state = caps.name("state").map_or("", |m| m.as_str()).to_uppercase();
        let zip = caps.name("zip").map_or("", |m| m.as_str());
        return format!("{}, {}, {} {}", titleize(street), titleize(city), state, zip);
    }

    // Fallback: tidy comma spacing and title-case
    let s2 = COMMA.replace_all(&s0, ", ");
    titleize(&s2)
}

/// Capitalize each whitespace-separated word (rest lowercased).
fn titleize(part: &str) -> String {
    part.split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(w: &str) -> String {
    let mut chars = w.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
