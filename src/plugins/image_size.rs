use anyhow::Context;
use serde_json::Value;

use super::{Plugin, is_image};
use crate::fs::FileSystem;
use crate::models::{EntryFields, ManifestEntry};

/// Adds pixel `width` and `height` for raster images.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageSizePlugin;

impl Plugin for ImageSizePlugin {
  fn name(&self) -> &str {
    "image-size"
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

    let bytes = fs
      .read(path)
      .with_context(|| format!("failed to read {}", path.display()))?;
    let size = imagesize::blob_size(&bytes)
      .with_context(|| format!("failed to read image dimensions of {}", path.display()))?;
    fields.insert("width".into(), Value::from(size.width as u64));
    fields.insert("height".into(), Value::from(size.height as u64));
    Ok(fields)
  }
}
