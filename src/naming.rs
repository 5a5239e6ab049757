//! Hashed file name templates.
//!
//! A template such as `{basename}-hc{hash}{extname}` is compiled once into a list of
//! segments. The same segments drive both rendering and recognition, so a name produced by
//! [`HashPattern::render`] is always accepted by [`HashPattern::is_hashed`].

use std::path::{Path, PathBuf};

use regex::Regex;

use crate::error::{HashError, HashResult};

/// Length of a full hex digest produced by [`crate::hashing::ContentHasher`].
pub const FULL_HASH_LENGTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
  Literal(String),
  Basename,
  Hash,
  Extname,
}

/// Compiled hashed-name template: a renderer and a matcher derived from one definition.
#[derive(Debug, Clone)]
pub struct HashPattern {
  template: String,
  segments: Vec<Segment>,
  hash_length: usize,
  matcher: Regex,
}

impl HashPattern {
  /// Compile `template`, truncating embedded hashes to `hash_length` characters.
  ///
  /// The template must contain `{hash}` exactly once, otherwise hashed names could not be
  /// told apart from ordinary ones.
  pub fn compile(template: &str, hash_length: Option<usize>) -> HashResult<Self> {
    let invalid = |message: &str| HashError::InvalidTemplate {
      template: template.to_string(),
      message: message.to_string(),
    };

    let hash_length = hash_length.unwrap_or(FULL_HASH_LENGTH);
    if hash_length == 0 || hash_length > FULL_HASH_LENGTH {
      return Err(invalid("hash length must be between 1 and 32"));
    }

    let segments = parse_segments(template);
    let hash_count = segments
      .iter()
      .filter(|segment| **segment == Segment::Hash)
      .count();
    if hash_count != 1 {
      return Err(invalid("the template must contain {hash} exactly once"));
    }
    if segments.iter().any(|segment| match segment {
      Segment::Literal(text) => text.contains(['/', '\\']),
      _ => false,
    }) {
      return Err(invalid("the template must not contain path separators"));
    }

    let mut expression = String::from("(?i)^");
    for segment in &segments {
      match segment {
        Segment::Literal(text) => expression.push_str(&regex::escape(text)),
        Segment::Basename => expression.push_str(".*"),
        Segment::Hash => expression.push_str(&format!("[0-9a-f]{{{hash_length}}}")),
        Segment::Extname => expression.push_str(r"(?:\.[^.]*)?"),
      }
    }
    expression.push('$');

    let matcher = Regex::new(&expression).map_err(|err| invalid(&err.to_string()))?;

    Ok(Self {
      template: template.to_string(),
      segments,
      hash_length,
      matcher,
    })
  }

  /// Template text this pattern was compiled from.
  pub fn template(&self) -> &str {
    &self.template
  }

  /// Render the hashed file name for `original`, without a directory.
  pub fn render_file_name(&self, original: &Path, hash_code: &str) -> String {
    let file_name = original
      .file_name()
      .map(|name| name.to_string_lossy().into_owned())
      .unwrap_or_default();
    let (basename, extname) = split_extension(&file_name);
    let hash = &hash_code[..hash_code.len().min(self.hash_length)];

    self
      .segments
      .iter()
      .map(|segment| match segment {
        Segment::Literal(text) => text.as_str(),
        Segment::Basename => basename,
        Segment::Hash => hash,
        Segment::Extname => extname,
      })
      .collect()
  }

  /// Render the hashed path for `original` inside `target_dir`.
  pub fn render(&self, original: &Path, target_dir: &Path, hash_code: &str) -> PathBuf {
    target_dir.join(self.render_file_name(original, hash_code))
  }

  /// Whether the final component of `path` is a name this template produces.
  pub fn is_hashed(&self, path: &Path) -> bool {
    path
      .file_name()
      .map(|name| self.matcher.is_match(&name.to_string_lossy()))
      .unwrap_or(false)
  }
}

fn parse_segments(template: &str) -> Vec<Segment> {
  let mut segments = Vec::new();
  let mut literal = String::new();
  let mut rest = template;

  while !rest.is_empty() {
    let placeholder = [
      ("{basename}", Segment::Basename),
      ("{hash}", Segment::Hash),
      ("{extname}", Segment::Extname),
    ]
    .into_iter()
    .find(|(token, _)| rest.starts_with(*token));

    match placeholder {
      Some((token, segment)) => {
        if !literal.is_empty() {
          segments.push(Segment::Literal(std::mem::take(&mut literal)));
        }
        segments.push(segment);
        rest = &rest[token.len()..];
      }
      None => {
        let mut chars = rest.chars();
        if let Some(ch) = chars.next() {
          literal.push(ch);
        }
        rest = chars.as_str();
      }
    }
  }

  if !literal.is_empty() {
    segments.push(Segment::Literal(literal));
  }
  segments
}

/// Split a file name into its stem and its extension including the dot.
///
/// Leading-dot names such as `.htaccess` have no extension.
fn split_extension(file_name: &str) -> (&str, &str) {
  match file_name.rfind('.') {
    Some(index) if index > 0 => file_name.split_at(index),
    _ => (file_name, ""),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const HASH: &str = "1234567890abcdef1234567890abcdef";

  fn default_pattern() -> HashPattern {
    HashPattern::compile(crate::config::DEFAULT_RENAME_FORMAT, None).unwrap()
  }

  #[test]
  fn renders_the_default_template() {
    let pattern = default_pattern();
    let hashed = pattern.render(Path::new("/src/css/app.css"), Path::new("/out/css"), HASH);
    assert_eq!(
      hashed,
      PathBuf::from(format!("/out/css/app-hc{HASH}.css"))
    );
  }

  #[test]
  fn truncates_the_hash() {
    let pattern = HashPattern::compile("{basename}.{hash}{extname}", Some(8)).unwrap();
    assert_eq!(
      pattern.render_file_name(Path::new("logo.png"), HASH),
      "logo.12345678.png"
    );
    assert!(pattern.is_hashed(Path::new("logo.12345678.png")));
    assert!(!pattern.is_hashed(Path::new(&format!("logo.{HASH}.png"))));
  }

  #[test]
  fn recognises_full_hashed_paths_and_names() {
    let pattern = default_pattern();
    assert!(pattern.is_hashed(Path::new(&format!("/foo/bar/baz/blah-hc{HASH}.js"))));
    assert!(pattern.is_hashed(Path::new(&format!("blah-hc{HASH}.js"))));
  }

  #[test]
  fn rejects_names_that_only_resemble_hashed_names() {
    let pattern = default_pattern();
    assert!(!pattern.is_hashed(Path::new(&format!("blah-hc-{HASH}.js"))));
    assert!(!pattern.is_hashed(Path::new(&format!("/foo/bar/blah-hc-{HASH}.js"))));
    assert!(!pattern.is_hashed(Path::new("/foo/bar/baz/blah.js")));
    assert!(!pattern.is_hashed(Path::new("blah-hc.js")));
    assert!(!pattern.is_hashed(Path::new("blah-hcfeed.js")));
  }

  #[test]
  fn every_rendered_name_is_recognised() {
    let pattern = default_pattern();
    for name in ["app.css", "archive.tar.gz", "README", ".htaccess", "app.js.map"] {
      let rendered = pattern.render_file_name(Path::new(name), HASH);
      assert!(pattern.is_hashed(Path::new(&rendered)), "{rendered}");
    }
  }

  #[test]
  fn literal_fragments_are_matched_literally() {
    let pattern = HashPattern::compile("{basename}.v[{hash}]{extname}", Some(4)).unwrap();
    let rendered = pattern.render_file_name(Path::new("a.css"), HASH);
    assert_eq!(rendered, "a.v[1234].css");
    assert!(pattern.is_hashed(Path::new(&rendered)));
    assert!(!pattern.is_hashed(Path::new("a.vX1234].css")));
  }

  #[test]
  fn rejects_templates_without_a_single_hash() {
    assert!(HashPattern::compile("{basename}{extname}", None).is_err());
    assert!(HashPattern::compile("{hash}-{hash}{extname}", None).is_err());
    assert!(HashPattern::compile("{basename}/{hash}{extname}", None).is_err());
    assert!(HashPattern::compile("{basename}-{hash}", Some(0)).is_err());
  }
}
