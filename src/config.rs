//! Run configuration describing filters, hashing mode, naming and error policy.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

const DEFAULT_CONFIG_FILE: &str = "fingerprint.config.json";

/// Template used to render hashed file names when none is configured.
pub const DEFAULT_RENAME_FORMAT: &str = "{basename}-hc{hash}{extname}";

/// Manifest format used when none is configured.
pub const DEFAULT_MANIFEST_FORMAT: &str = "json";

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Immutable per-run options. Every operation receives this value by reference.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HashOptions {
  /// Globs a file must match to be processed. Empty means every file.
  pub include: Vec<String>,
  /// Globs that exclude a file from processing.
  pub exclude: Vec<String>,
  /// Globs for files copied verbatim into the target tree without hashing.
  pub passthrough: Vec<String>,
  /// Name of the manifest serializer.
  pub manifest_format: String,
  /// Explicit manifest location; defaults to `<target>/manifest<ext>`.
  pub manifest_path: Option<PathBuf>,
  /// Record per-file failures and keep going instead of aborting.
  pub continue_on_error: bool,
  /// Skip a failing plugin's contribution instead of failing the file.
  pub continue_on_plugin_error: bool,
  /// Rewrite `url()` references inside stylesheets.
  pub process_css: bool,
  /// Hash `.map` sidecars and patch `sourceMappingURL` pragmas.
  pub process_map: bool,
  /// Hash the byte length of recognised binary files instead of their content.
  pub quick_hash: bool,
  /// Reuse the hashed names recorded in the previous manifest when content is unchanged.
  pub amend: bool,
  /// Retention window, in days, used by the clean-old pass.
  pub clean_old_days: Option<u64>,
  /// Directory virtual paths are relative to; defaults to the source directory.
  pub base_dir: Option<PathBuf>,
  /// Prefix prepended to patched `sourceMappingURL` values.
  pub sourcemap_url_prefix: String,
  /// Reference hashed sourcemaps by file name only rather than by virtual path.
  pub sourcemap_basename_only: bool,
  /// Number of hash characters embedded in file names. `None` keeps the full digest.
  pub hash_length: Option<usize>,
  /// Hashed file name template with `{basename}`, `{hash}` and `{extname}` placeholders.
  pub rename_format: String,
  /// Plugin names that should not be assembled into the pipeline.
  pub disabled_plugins: Vec<String>,
}

impl Default for HashOptions {
  fn default() -> Self {
    Self {
      include: Vec::new(),
      exclude: Vec::new(),
      passthrough: Vec::new(),
      manifest_format: DEFAULT_MANIFEST_FORMAT.into(),
      manifest_path: None,
      continue_on_error: false,
      continue_on_plugin_error: false,
      process_css: true,
      process_map: true,
      quick_hash: false,
      amend: false,
      clean_old_days: None,
      base_dir: None,
      sourcemap_url_prefix: String::new(),
      sourcemap_basename_only: false,
      hash_length: None,
      rename_format: DEFAULT_RENAME_FORMAT.into(),
      disabled_plugins: Vec::new(),
    }
  }
}

impl HashOptions {
  /// Attempt to load options from the provided directory.
  ///
  /// When the configuration file does not exist or fails to parse we fall back to default
  /// values so callers can still layer command-line flags on top.
  pub fn discover(dir: &Path) -> Self {
    let candidate = dir.join(DEFAULT_CONFIG_FILE);
    Self::from_path(&candidate).unwrap_or_default()
  }

  /// Read options from a specific JSON file.
  pub fn from_path(path: &Path) -> Option<Self> {
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
  }

  /// Retention window for clean-old, if one is configured.
  pub fn clean_old_window(&self) -> Option<Duration> {
    self
      .clean_old_days
      .map(|days| Duration::from_secs(days.saturating_mul(SECONDS_PER_DAY)))
  }

  /// Whether a plugin with the given name may run.
  pub fn plugin_enabled(&self, name: &str) -> bool {
    !self.disabled_plugins.iter().any(|disabled| disabled == name)
  }
}
