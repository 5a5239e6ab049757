use std::path::Path;

use serde_json::Value;

use super::Plugin;
use crate::fs::FileSystem;
use crate::models::{EntryFields, ManifestEntry};

/// Records the extension of each file under `ext`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileExtensionPlugin;

impl Plugin for FileExtensionPlugin {
  fn name(&self) -> &str {
    "file-extension"
  }

  fn process_file(
    &self,
    entry: &ManifestEntry,
    _fs: &dyn FileSystem,
  ) -> anyhow::Result<EntryFields> {
    let ext = Path::new(&entry.path)
      .extension()
      .map(|ext| format!(".{}", ext.to_string_lossy()))
      .unwrap_or_default();

    let mut fields = EntryFields::new();
    fields.insert("ext".into(), Value::String(ext));
    Ok(fields)
  }
}
