//! Text-to-number conversions for values scraped off player pages.

/// Stat cell → number. `"54%"` → 54, `"0,45"` → 0.45, `"-"` → None.
/// A comma is read as a decimal point.
pub fn parse_stat_value(raw: &str) -> Option<f64> {
    let s = raw.trim();
    let s = s.strip_suffix('%').unwrap_or(s).trim();
    let s = s.replace(',', ".");
    if s.contains('.') {
        s.parse::<f64>().ok().filter(|v| v.is_finite())
    } else {
        s.parse::<i64>().ok().map(|v| v as f64)
    }
}

/// Market value → euros. `"€45M"` → 45_000_000, `"€800K"` → 800_000.
pub fn parse_market_value(raw: &str) -> Option<i64> {
    let s = raw.replace('€', "");
    let s = s.trim().to_uppercase();
    if let Some(n) = s.strip_suffix('M') {
        return n.trim().parse::<f64>().ok().map(|v| (v * 1_000_000.0) as i64);
    }
    if let Some(n) = s.strip_suffix('K') {
        return n.trim().parse::<f64>().ok().map(|v| (v * 1_000.0) as i64);
    }
    s.parse::<i64>().ok()
}

/// First whitespace-separated token when it is all digits. `"183 cm"` → 183.
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    let token = raw.split_whitespace().next()?;
    if token.bytes().all(|b| b.is_ascii_digit()) {
        token.parse().ok()
    } else {
        None
    }
}

/// Shirt numbers are plain integers; anything else is dropped.
pub fn parse_shirt_number(raw: &str) -> Option<i64> {
    let s = raw.trim();
    if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
        s.parse().ok()
    } else {
        None
    }
}

/// Club text with a loan marker removed. `"Chelsea (on loan)"` → `"Chelsea"`.
pub fn strip_loan_suffix(club: &str) -> &str {
    club.trim()
        .strip_suffix("(on loan)")
        .map(str::trim)
        .unwrap_or_else(|| club.trim())
}
