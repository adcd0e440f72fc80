//! URL slugs derived from titles

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static STRIP: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").expect("valid regex"));
static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-\s]+").expect("valid regex"));

/// Convert a title into a lowercase, hyphen separated ASCII slug.
///
/// Accented letters are decomposed and reduced to their ASCII base, every
/// other non-ASCII character is dropped. The result may be empty.
pub fn slugify(value: &str) -> String {
    let ascii: String = value.nfkd().filter(char::is_ascii).collect();
    let cleaned = STRIP.replace_all(&ascii, "");
    let lowered = cleaned.trim().to_lowercase();
    SEPARATORS.replace_all(&lowered, "-").into_owned()
}

/// `slugify`, with `"null"` standing in for an empty result
pub fn slug_or_null(value: &str) -> String {
    let slug = slugify(value);
    if slug.is_empty() {
        "null".to_string()
    } else {
        slug
    }
}

/// Candidate `n` when probing for a free slug
pub fn numbered(base: &str, n: u32) -> String {
    format!("{}-{}", base, n)
}
