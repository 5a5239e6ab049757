use std::path::Path;

use anyhow::Context;
use base64::{Engine as _, engine::general_purpose};
use serde_json::Value;

use super::{Plugin, is_image};
use crate::fs::FileSystem;
use crate::models::{EntryFields, ManifestEntry};

/// Largest image, in bytes, that is inlined as a data URI.
pub const DEFAULT_MAX_SIZE: u64 = 512;

/// Inlines small images as a `datauri` field.
#[derive(Debug, Clone, Copy)]
pub struct DataUriPlugin {
  max_size: u64,
}

impl Default for DataUriPlugin {
  fn default() -> Self {
    Self {
      max_size: DEFAULT_MAX_SIZE,
    }
  }
}

impl DataUriPlugin {
  /// Plugin inlining images of at most `max_size` bytes.
  pub fn with_max_size(max_size: u64) -> Self {
    Self { max_size }
  }
}

impl Plugin for DataUriPlugin {
  fn name(&self) -> &str {
    "data-uri"
  }

  fn process_file(
    &self,
    entry: &ManifestEntry,
    fs: &dyn FileSystem,
  ) -> anyhow::Result<EntryFields> {
    let mut fields = EntryFields::new();
    let path = &entry.physical_path;
    if !is_image(path) {
      return Ok(fields);
    }

    let stat = fs
      .stat(path)
      .with_context(|| format!("failed to stat {}", path.display()))?;
    if stat.len > self.max_size {
      return Ok(fields);
    }

    let bytes = fs
      .read(path)
      .with_context(|| format!("failed to read {}", path.display()))?;
    let encoded = general_purpose::STANDARD.encode(bytes);
    fields.insert(
      "datauri".into(),
      Value::String(format!("data:{};base64,{}", mime_type(path), encoded)),
    );
    Ok(fields)
  }
}

fn mime_type(path: &Path) -> &'static str {
  let ext = path
    .extension()
    .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
    .unwrap_or_default();
  match ext.as_str() {
    "jpg" | "jpeg" => "image/jpeg",
    "png" => "image/png",
    "gif" => "image/gif",
    "bmp" => "image/bmp",
    "tiff" => "image/tiff",
    "webp" => "image/webp",
    _ => "application/octet-stream",
  }
}
