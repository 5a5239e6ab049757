//! Manifest construction and persistence, split into the resolution engine and the
//! serialization formats.

mod engine;
mod serializer;

use std::path::{Path, PathBuf};

pub use engine::{ManifestEngine, Resolution, RunContext};
pub use serializer::{
  JsonArraySerializer, JsonObjectSerializer, JsonSymfonySerializer, ManifestSerializer,
  TabSerializer, serializer_for,
};

use crate::config::HashOptions;

/// Base name of the manifest written into the target directory.
pub const MANIFEST_STEM: &str = "manifest";

/// Where a run over `target_dir` keeps its manifest.
///
/// An explicit `manifestPath` wins; otherwise the file sits at the target root and takes its
/// extension from the serializer.
pub fn manifest_location(
  options: &HashOptions,
  target_dir: &Path,
  serializer: &dyn ManifestSerializer,
) -> PathBuf {
  match &options.manifest_path {
    Some(path) => path.clone(),
    None => target_dir.join(format!("{MANIFEST_STEM}{}", serializer.extension())),
  }
}
