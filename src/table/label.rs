use regex::Regex;
use std::sync::LazyLock;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("Hardcode regex pattern"));

/// Normalizes a column label: every whitespace run becomes `_`, then the label is lower-cased.
///
/// ```
/// assert_eq!(rusty_readdir::normalize_label("Col  1"), "col_1");
/// ```
pub fn normalize_label(label: &str) -> String {
    WHITESPACE.replace_all(label, "_").to_lowercase()
}
