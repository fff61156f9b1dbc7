//! Text helpers shared by the extractor and the averaging engine.
//!
//! Everything the matcher sees goes through [`normalize`] first: lowercase,
//! accents stripped. Scores travel as raw text until the moment an average
//! is computed, so [`parse_decimal`] accepts both `7,5` and `7.5`.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Lowercases and strips diacritics (NFD decomposition, combining marks
/// removed). Matching and boundary-finding always run on this form.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Parses a decimal score accepting either `,` or `.` as the separator.
///
/// Anything unparseable (including the empty string and lone dashes) is
/// `None`, absent, never zero.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let cleaned = raw.trim().replace(',', ".");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Formats a score the way the portal displays it (two decimal places).
pub fn format_score(value: f64) -> String {
    format!("{:.2}", value)
}

/// Returns the last `n` characters of `text` (used for short lookbacks
/// behind a match position).
pub fn tail_chars(text: &str, n: usize) -> &str {
    let char_count = text.chars().count();
    if char_count <= n {
        return text;
    }
    let skip = char_count - n;
    let (idx, _) = text.char_indices().nth(skip).unwrap_or((0, ' '));
    &text[idx..]
}
