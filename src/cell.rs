use once_cell::sync::Lazy;
use regex::Regex;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag regex"));

/// Plain text of a raw table cell.
///
/// Tags are dropped, `&nbsp;` becomes a space and `&amp;` an ampersand. Any other
/// entity is left as written.
pub fn normalize(raw: &str) -> String {
    let text = TAG_RE.replace_all(raw, "");
    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

/// True when the whole value is one or more ASCII digits.
///
/// Score pairs (`3-1`), placeholders (`TBC`) and dates (`14/2`) all fail, which is
/// what separates a standings grid from a fixture grid of the same shape.
pub fn is_stat_cell(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}
