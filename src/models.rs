//! Data structures produced while fingerprinting a tree of assets.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Plugin-contributed metadata keyed by field name.
pub type EntryFields = Map<String, Value>;

/// Serialized field holding the virtual path.
pub const PATH_FIELD: &str = "path";

/// Serialized field holding the hashed virtual path.
pub const HASHED_PATH_FIELD: &str = "hashedPath";

/// One fingerprinted file.
///
/// Only `path`, `hashedPath` and the plugin fields are serialized. Physical paths, the raw
/// hash code and the transient flags stay internal to a run.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
  /// Root-relative virtual path of the original file, forward-slash separated.
  pub path: String,
  /// Root-relative virtual path of the hashed copy.
  pub hashed_path: String,
  /// Plugin-contributed fields such as `width` and `height`.
  #[serde(flatten)]
  pub fields: EntryFields,
  /// Location of the original file.
  #[serde(skip)]
  pub physical_path: PathBuf,
  /// Location of the hashed copy.
  #[serde(skip)]
  pub hashed_physical_path: PathBuf,
  /// Digest the hashed name was derived from.
  #[serde(skip)]
  pub hash_code: String,
  /// Output text when the file was rewritten rather than copied.
  #[serde(skip)]
  pub transformed_content: Option<String>,
  /// Seeded from a previous manifest and not yet confirmed by this run.
  #[serde(skip)]
  pub unverified: bool,
}

impl ManifestEntry {
  /// Re-expand the physical locations of an entry parsed from a previous manifest.
  pub fn expand_physical(&mut self, base_dir: &Path, target_dir: &Path) {
    self.physical_path = base_dir.join(self.path.trim_start_matches('/'));
    self.hashed_physical_path = target_dir.join(self.hashed_path.trim_start_matches('/'));
  }

  /// Shallow-merge plugin output. Path fields are reserved and never overwritten.
  ///
  /// Returns the names of any reserved fields that were dropped.
  pub fn merge_fields(&mut self, partial: EntryFields) -> Vec<String> {
    let mut rejected = Vec::new();
    for (key, value) in partial {
      if key == PATH_FIELD || key == HASHED_PATH_FIELD {
        rejected.push(key);
      } else {
        self.fields.insert(key, value);
      }
    }
    rejected
  }

  /// Value of a serialized field by name, path fields included.
  pub fn field(&self, name: &str) -> Option<Value> {
    match name {
      PATH_FIELD => Some(Value::String(self.path.clone())),
      HASHED_PATH_FIELD => Some(Value::String(self.hashed_path.clone())),
      _ => self.fields.get(name).cloned(),
    }
  }
}

/// A per-file failure recorded while the run continued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileError {
  /// File that failed.
  pub path: PathBuf,
  /// Human readable failure description.
  pub message: String,
}

impl std::fmt::Display for FileError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "ERROR: {}: {}", self.path.display(), self.message)
  }
}

/// Entries and failures accumulated by one run.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
  /// Resolved entries, in resolution order until sorted for serialization.
  pub entries: Vec<ManifestEntry>,
  /// Recorded per-file failures.
  pub errors: Vec<FileError>,
}

impl Manifest {
  /// Entry for an original virtual path.
  pub fn get(&self, virtual_path: &str) -> Option<&ManifestEntry> {
    self.entries.iter().find(|entry| entry.path == virtual_path)
  }

  /// Sort entries by virtual path for deterministic output.
  pub fn sort(&mut self) {
    self.entries.sort_by(|a, b| a.path.cmp(&b.path));
  }

  /// True when no per-file failures were recorded.
  pub fn is_success(&self) -> bool {
    self.errors.is_empty()
  }
}

/// Outcome of a complete run.
#[derive(Debug, Clone)]
pub struct RunReport {
  /// Entries written to the manifest and any recorded failures.
  pub manifest: Manifest,
  /// Where the manifest was written.
  pub manifest_path: PathBuf,
}

impl RunReport {
  /// The run succeeded iff no per-file failure was recorded.
  pub fn is_success(&self) -> bool {
    self.manifest.is_success()
  }
}

/// Files removed by a cleanup pass.
#[derive(Debug, Clone, Default)]
pub struct CleanReport {
  /// Deleted files, manifest included when it existed.
  pub removed: Vec<PathBuf>,
}
