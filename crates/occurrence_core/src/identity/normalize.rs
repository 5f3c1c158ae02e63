//! Name normalization used as the person dedup key.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Normalizes a display name into its dedup key.
///
/// Trims, decomposes (NFD) and drops combining marks, lowercases, and
/// collapses whitespace runs to one space. Blank input yields `""`.
pub fn normalize_name(raw: &str) -> String {
    let stripped: String = raw
        .trim()
        .nfd()
        .filter(|ch| !is_combining_mark(*ch))
        .collect::<String>()
        .to_lowercase();
    WHITESPACE_RE.replace_all(&stripped, " ").into_owned()
}
