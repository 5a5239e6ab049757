//! Run orchestrator: validates a run's inputs, drives the manifest engine over the candidate
//! files and persists the resulting manifest.

use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

use crate::asset_paths::normalize_path;
use crate::clean;
use crate::config::HashOptions;
use crate::error::{HashError, HashResult};
use crate::fs::FileSystem;
use crate::manifest::{
  ManifestEngine, ManifestSerializer, RunContext, manifest_location, serializer_for,
};
use crate::models::{CleanReport, ManifestEntry, RunReport};
use crate::plugins::PluginPipeline;

/// High-level entry point for fingerprinting runs and cleanup passes.
pub struct AssetHasher<'a> {
  options: &'a HashOptions,
  fs: &'a dyn FileSystem,
  plugins: &'a PluginPipeline,
}

impl<'a> AssetHasher<'a> {
  /// Create a hasher driven by `options`, touching files only through `fs`.
  pub fn new(options: &'a HashOptions, fs: &'a dyn FileSystem, plugins: &'a PluginPipeline) -> Self {
    Self {
      options,
      fs,
      plugins,
    }
  }

  /// Fingerprint every file under `source_dir`, mirroring hashed copies into `target_dir`.
  pub fn process_directory(&self, source_dir: &Path, target_dir: &Path) -> HashResult<RunReport> {
    if !self.fs.exists(source_dir) {
      return Err(HashError::SourceMissing {
        path: source_dir.to_path_buf(),
      });
    }

    let files = self
      .fs
      .list_files(source_dir)
      .map_err(|err| HashError::io(source_dir, err))?;
    self.process_files(&files, source_dir, target_dir)
  }

  /// Fingerprint an explicit list of files.
  ///
  /// Virtual paths are relative to the configured `baseDir`, or to `source_dir` when none is
  /// set. The previous manifest is removed before any file is processed, so an aborted run
  /// never leaves a stale manifest behind.
  pub fn process_files(
    &self,
    files: &[PathBuf],
    source_dir: &Path,
    target_dir: &Path,
  ) -> HashResult<RunReport> {
    let base_dir = self
      .options
      .base_dir
      .clone()
      .unwrap_or_else(|| source_dir.to_path_buf());
    if !self.fs.exists(&base_dir) {
      return Err(HashError::SourceMissing { path: base_dir });
    }

    let serializer = serializer_for(&self.options.manifest_format)?;
    let context = RunContext::new(self.options, self.fs, self.plugins, &base_dir, target_dir)?;
    let manifest_path = manifest_location(self.options, target_dir, serializer.as_ref());

    info!("---------------------");
    info!(
      "Processing directory: {} > {}",
      base_dir.display(),
      target_dir.display()
    );
    info!("manifest format: {}", serializer.name());
    if !self.plugins.names().is_empty() {
      debug!("plugins: {}", self.plugins.names().join(", "));
    }
    info!("---------------------");

    let previous = if self.options.amend {
      self.load_previous(&manifest_path, serializer.as_ref())?
    } else {
      Vec::new()
    };

    self
      .fs
      .remove(&manifest_path, false)
      .map_err(|err| HashError::io(&manifest_path, err))?;

    let mut engine = ManifestEngine::new(&context);
    engine.seed(previous);
    let own_manifest = normalize_path(&manifest_path);
    for file in files {
      if normalize_path(file) == own_manifest {
        continue;
      }
      if let Err(err) = engine.resolve(file) {
        error!("{err}");
        error!("Aborted due to errors. To ignore errors, enable continue-on-error.");
        return Err(err);
      }
    }

    let mut manifest = engine.into_manifest();
    manifest.sort();

    let text = serializer
      .serialize(&manifest.entries)
      .map_err(|err| HashError::Manifest {
        path: manifest_path.clone(),
        message: format!("{err:#}"),
      })?;
    info!("Writing manifest: {}", manifest_path.display());
    self
      .fs
      .write(&manifest_path, text.as_bytes())
      .map_err(|err| HashError::io(&manifest_path, err))?;

    info!("---------------------");
    if manifest.is_success() {
      info!("Success");
    } else {
      error!("Errors found:");
      for failure in &manifest.errors {
        error!("{failure}");
      }
    }

    Ok(RunReport {
      manifest,
      manifest_path,
    })
  }

  /// Remove the manifest and every hashed file under `target_dir`.
  pub fn clean(&self, target_dir: &Path) -> HashResult<CleanReport> {
    clean::clean(self.options, self.fs, target_dir)
  }

  /// Remove hashed files under `target_dir` that the manifest no longer references and that
  /// are older than the configured retention window.
  pub fn clean_old(&self, target_dir: &Path) -> HashResult<CleanReport> {
    clean::clean_old(self.options, self.fs, target_dir)
  }

  fn load_previous(
    &self,
    manifest_path: &Path,
    serializer: &dyn ManifestSerializer,
  ) -> HashResult<Vec<ManifestEntry>> {
    if !self.fs.exists(manifest_path) {
      debug!("no previous manifest at {}", manifest_path.display());
      return Ok(Vec::new());
    }

    let text = self
      .fs
      .read_to_string(manifest_path)
      .map_err(|err| HashError::io(manifest_path, err))?;
    let entries = serializer
      .parse(&text)
      .map_err(|err| HashError::Manifest {
        path: manifest_path.to_path_buf(),
        message: format!("{err:#}"),
      })?;
    info!(
      "Amending {} entries from {}",
      entries.len(),
      manifest_path.display()
    );
    Ok(entries)
  }
}
