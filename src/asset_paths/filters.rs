use std::sync::OnceLock;

use regex::Regex;

/// Schemes and prefixes that point outside the source tree or carry their content inline.
fn external_reference() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^(?:https?:)?//|^data:").expect("invalid external reference regex")
    })
}

/// Determine whether a stylesheet `url()` reference should be left untouched.
///
/// Absolute, protocol-relative and `data:` URLs have no hashed sibling to point at. Blank
/// references are skipped as well.
pub fn should_ignore_asset_reference(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || external_reference().is_match(value)
}
