//! Include, exclude and passthrough filtering of candidate files.

use glob::{MatchOptions, Pattern};

use crate::config::HashOptions;
use crate::error::{HashError, HashResult};

/// How a candidate file should be treated by a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
  /// Hash the file and record it in the manifest.
  Included,
  /// Leave the file alone.
  Excluded,
  /// Copy the file verbatim to its mirrored location without a manifest entry.
  Passthrough,
}

/// Compiled glob sets matched against base-relative, forward-slash paths.
///
/// A pattern without a `/` also matches against the file name alone, so `*.txt` excludes
/// text files at any depth.
#[derive(Debug, Clone, Default)]
pub struct PathSelection {
  include: Option<Vec<Pattern>>,
  exclude: Vec<Pattern>,
  passthrough: Vec<Pattern>,
}

impl PathSelection {
  /// Compile the glob lists held by `options`.
  pub fn from_options(options: &HashOptions) -> HashResult<Self> {
    let include = compile_list(&options.include)?;
    Ok(Self {
      include: (!include.is_empty()).then_some(include),
      exclude: compile_list(&options.exclude)?,
      passthrough: compile_list(&options.passthrough)?,
    })
  }

  /// Classify `relative_path`. `mirrored` is true when the target tree is a different
  /// directory from the source tree; passthrough only applies then.
  pub fn classify(&self, relative_path: &str, mirrored: bool) -> PathClass {
    if self.is_excluded(relative_path) {
      return PathClass::Excluded;
    }

    if mirrored && any_matches(&self.passthrough, relative_path) {
      return PathClass::Passthrough;
    }

    PathClass::Included
  }

  /// Excluded when an exclude pattern matches, or when includes exist and none match.
  pub fn is_excluded(&self, relative_path: &str) -> bool {
    if any_matches(&self.exclude, relative_path) {
      return true;
    }

    match &self.include {
      Some(include) => !any_matches(include, relative_path),
      None => false,
    }
  }

  /// Returns true when no filtering rules are active.
  #[cfg(test)]
  fn is_unfiltered(&self) -> bool {
    self.include.is_none() && self.exclude.is_empty() && self.passthrough.is_empty()
  }
}

/// Compile raw patterns, trimming whitespace and leading slashes and dropping blanks.
fn compile_list(values: &[String]) -> HashResult<Vec<Pattern>> {
  values
    .iter()
    .map(|value| value.trim().trim_start_matches('/'))
    .filter(|value| !value.is_empty())
    .map(|value| {
      Pattern::new(value).map_err(|err| HashError::InvalidPattern {
        pattern: value.to_string(),
        message: err.to_string(),
      })
    })
    .collect()
}

fn any_matches(patterns: &[Pattern], relative_path: &str) -> bool {
  let relative_path = relative_path.trim_start_matches('/');
  let file_name = relative_path.rsplit('/').next().unwrap_or(relative_path);
  let options = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
  };

  patterns.iter().any(|pattern| {
    pattern.matches_with(relative_path, options)
      || (!pattern.as_str().contains('/') && pattern.matches_with(file_name, options))
  })
}
