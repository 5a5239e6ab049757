//! Stylesheet `url()` rewriting.

use std::sync::OnceLock;

use regex::Regex;

use crate::asset_paths::{should_ignore_asset_reference, split_url_suffix};

fn url_pattern() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| Regex::new(r"(?i)url\(([^)]*?)\)").expect("invalid css url regex"))
}

/// Rewrite every `url(...)` reference in `css` through `resolve`.
///
/// External and data URLs are left alone. A trailing `?query` or `#fragment` is split off
/// before `resolve` sees the path and reattached afterwards. Quotes, whitespace inside the
/// parentheses and all surrounding text are preserved byte for byte. The first error
/// returned by `resolve` stops the rewrite.
pub fn rewrite_css_urls<F, E>(css: &str, mut resolve: F) -> Result<String, E>
where
  F: FnMut(&str) -> Result<String, E>,
{
  let mut output = String::with_capacity(css.len());
  let mut last_end = 0;

  for captures in url_pattern().captures_iter(css) {
    let Some(inner) = captures.get(1) else {
      continue;
    };

    let Some(rewritten) = rewrite_reference(inner.as_str(), &mut resolve)? else {
      continue;
    };

    output.push_str(&css[last_end..inner.start()]);
    output.push_str(&rewritten);
    last_end = inner.end();
  }

  output.push_str(&css[last_end..]);
  Ok(output)
}

/// Returns the replacement for the text between the parentheses, or `None` to keep it.
fn rewrite_reference<F, E>(inner: &str, resolve: &mut F) -> Result<Option<String>, E>
where
  F: FnMut(&str) -> Result<String, E>,
{
  let trimmed_start = inner.trim_start();
  let leading = &inner[..inner.len() - trimmed_start.len()];
  let body = trimmed_start.trim_end();
  let trailing = &trimmed_start[body.len()..];

  let (quote, url) = match body.chars().next() {
    Some(quote @ ('"' | '\'')) if body.len() >= 2 && body.ends_with(quote) => {
      (&body[..1], &body[1..body.len() - 1])
    }
    _ => ("", body),
  };

  if should_ignore_asset_reference(url) {
    return Ok(None);
  }

  let (path, suffix) = split_url_suffix(url);
  if path.is_empty() {
    return Ok(None);
  }

  let resolved = resolve(path)?;
  Ok(Some(format!(
    "{leading}{quote}{resolved}{suffix}{quote}{trailing}"
  )))
}
