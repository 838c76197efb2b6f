//! Small helpers.

use chrono::NaiveDateTime;

pub fn sanitize_symbol(sym: &str) -> String {
    sym.trim().to_uppercase()
}

/// Parse a numeric token from pasted broker text. Thousands separators and a
/// currency sign are stripped first.
pub fn clean_numeric_token(s: &str) -> Option<f64> {
    let cleaned: String = s.chars().filter(|c| *c != ',' && *c != '$').collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

/// Formats accepted for a user-typed local datetime.
const LOCAL_TS_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Lenient parse of a user-supplied local timestamp. A partially typed value
/// yields None; it must never abort an evaluation.
pub fn parse_local_timestamp(s: &str) -> Option<NaiveDateTime> {
    let t = s.trim();
    LOCAL_TS_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(t, fmt).ok())
}

/// Currency rendering matching the report layout, e.g. "$-1,990.00".
pub fn format_usd(v: f64) -> String {
    let cents = (v.abs() * 100.0).round() as i64;
    let whole = (cents / 100).to_string();
    let frac = cents % 100;
    let mut grouped = String::new();
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if v < 0.0 && cents != 0 { "-" } else { "" };
    format!("${sign}{grouped}.{frac:02}")
}
