//! Manifest entry enrichment.
//!
//! A plugin inspects a resolved entry and returns extra fields that are shallow-merged
//! into it. Plugins run in order, so a later plugin may override an earlier one's fields.

mod data_uri;
mod file_extension;
mod image_size;

use tracing::warn;

pub use data_uri::DataUriPlugin;
pub use file_extension::FileExtensionPlugin;
pub use image_size::ImageSizePlugin;

use crate::config::HashOptions;
use crate::error::{HashError, HashResult};
use crate::fs::FileSystem;
use crate::models::{EntryFields, ManifestEntry};

/// Extensions the image plugins understand.
pub(crate) const IMAGE_EXTENSIONS: &[&str] = &["jpg", "png", "gif", "bmp", "tiff", "webp"];

/// Contributes metadata fields to manifest entries.
pub trait Plugin {
  /// Name used in logs and for disabling the plugin.
  fn name(&self) -> &str;

  /// Fields to merge into `entry`. Path fields in the result are ignored.
  ///
  /// File contents are read through `fs`, the same port the run writes through.
  fn process_file(
    &self,
    entry: &ManifestEntry,
    fs: &dyn FileSystem,
  ) -> anyhow::Result<EntryFields>;
}

/// Ordered list of plugins applied to every new entry.
#[derive(Default)]
pub struct PluginPipeline {
  plugins: Vec<Box<dyn Plugin>>,
}

impl std::fmt::Debug for PluginPipeline {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_list()
      .entries(self.plugins.iter().map(|plugin| plugin.name()))
      .finish()
  }
}

impl PluginPipeline {
  /// Pipeline running `plugins` in the given order.
  pub fn new(plugins: Vec<Box<dyn Plugin>>) -> Self {
    Self { plugins }
  }

  /// The bundled plugins, minus any disabled by `options`.
  pub fn builtin(options: &HashOptions) -> Self {
    let candidates: Vec<Box<dyn Plugin>> = vec![
      Box::new(DataUriPlugin::default()),
      Box::new(FileExtensionPlugin),
      Box::new(ImageSizePlugin),
    ];
    Self::new(
      candidates
        .into_iter()
        .filter(|plugin| options.plugin_enabled(plugin.name()))
        .collect(),
    )
  }

  /// Names of the assembled plugins, in order.
  pub fn names(&self) -> Vec<&str> {
    self.plugins.iter().map(|plugin| plugin.name()).collect()
  }

  /// Run every plugin over `entry`, merging the fields each one returns.
  ///
  /// With `tolerate_errors` a failing plugin is logged and skipped for this entry; without
  /// it the first failure is returned and the entry keeps whatever earlier plugins added.
  pub fn apply(
    &self,
    entry: &mut ManifestEntry,
    fs: &dyn FileSystem,
    tolerate_errors: bool,
  ) -> HashResult<()> {
    for plugin in &self.plugins {
      match plugin.process_file(entry, fs) {
        Ok(fields) => {
          for key in entry.merge_fields(fields) {
            warn!(plugin = plugin.name(), field = %key, "plugin tried to overwrite a path field");
          }
        }
        Err(err) => {
          let error = HashError::Plugin {
            plugin: plugin.name().to_string(),
            path: entry.physical_path.clone(),
            message: format!("{err:#}"),
          };
          if !tolerate_errors {
            return Err(error);
          }
          warn!("{error}");
        }
      }
    }
    Ok(())
  }
}

pub(crate) fn is_image(path: &std::path::Path) -> bool {
  path
    .extension()
    .and_then(|ext| ext.to_str())
    .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
    .unwrap_or(false)
}
