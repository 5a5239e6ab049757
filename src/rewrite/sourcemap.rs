//! `sourceMappingURL` pragma patching for JavaScript and CSS bundles.

use std::sync::OnceLock;

use regex::{Captures, Regex};

fn js_pragma() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| {
    Regex::new(r"(?mR)(^\s*//#\s*sourceMappingURL=)(.*)$").expect("invalid js sourcemap regex")
  })
}

fn css_pragma() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| {
    Regex::new(r"(?mR)(^\s*/\*\s*#\s*sourceMappingURL=)(.*?)(\s*\*/)$")
      .expect("invalid css sourcemap regex")
  })
}

/// Whether files with this extension (without the dot) carry a pragma we know how to patch.
pub fn has_pragma_syntax(extension: &str) -> bool {
  pragma_for(extension).is_some()
}

fn pragma_for(extension: &str) -> Option<&'static Regex> {
  match extension.to_ascii_lowercase().as_str() {
    "js" | "mjs" | "cjs" => Some(js_pragma()),
    "css" => Some(css_pragma()),
    _ => None,
  }
}

/// Point the `sourceMappingURL` pragma of `text` at `url_prefix + new_map_reference`.
///
/// `extension` is the bundle's extension without the dot. Only the first pragma is
/// replaced and the rest of the text is returned unchanged. Returns `None` for extensions
/// that carry no pragma syntax; text without a pragma comes back unmodified.
pub fn patch_source_map_pragma(
  extension: &str,
  text: &str,
  new_map_reference: &str,
  url_prefix: &str,
) -> Option<String> {
  let pattern = pragma_for(extension)?;
  let patched = pattern.replace(text, |caps: &Captures| {
    format!(
      "{}{}{}{}",
      &caps[1],
      url_prefix,
      new_map_reference,
      caps.get(3).map(|m| m.as_str()).unwrap_or_default()
    )
  });
  Some(patched.into_owned())
}
