//! Cleanup passes over a target tree.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::{debug, info};

use crate::asset_paths::normalize_path;
use crate::config::HashOptions;
use crate::error::{HashError, HashResult};
use crate::fs::FileSystem;
use crate::manifest::{manifest_location, serializer_for};
use crate::models::CleanReport;
use crate::naming::HashPattern;

/// Delete the manifest and every hashed-named file under `target_dir`.
pub fn clean(
  options: &HashOptions,
  fs: &dyn FileSystem,
  target_dir: &Path,
) -> HashResult<CleanReport> {
  let serializer = serializer_for(&options.manifest_format)?;
  let pattern = HashPattern::compile(&options.rename_format, options.hash_length)?;
  let manifest_path = manifest_location(options, target_dir, serializer.as_ref());

  info!("---------------------");
  info!("Cleaning directory: {}", target_dir.display());
  info!("---------------------");

  let mut report = CleanReport::default();
  if fs.exists(&manifest_path) {
    delete(fs, &manifest_path, &mut report)?;
  }

  for file in hashed_files(fs, &pattern, target_dir)? {
    delete(fs, &file, &mut report)?;
  }
  Ok(report)
}

/// Delete hashed-named files the current manifest no longer references, once they are older
/// than the configured retention window. Without a window every unreferenced file goes.
pub fn clean_old(
  options: &HashOptions,
  fs: &dyn FileSystem,
  target_dir: &Path,
) -> HashResult<CleanReport> {
  clean_old_at(options, fs, target_dir, SystemTime::now())
}

fn clean_old_at(
  options: &HashOptions,
  fs: &dyn FileSystem,
  target_dir: &Path,
  now: SystemTime,
) -> HashResult<CleanReport> {
  let serializer = serializer_for(&options.manifest_format)?;
  let pattern = HashPattern::compile(&options.rename_format, options.hash_length)?;
  let manifest_path = manifest_location(options, target_dir, serializer.as_ref());
  let window = options.clean_old_window().unwrap_or(Duration::ZERO);

  info!("---------------------");
  info!(
    "Cleaning files older than {} days in: {}",
    window.as_secs() / 86_400,
    target_dir.display()
  );
  info!("---------------------");

  let mut keep = BTreeSet::new();
  if fs.exists(&manifest_path) {
    let text = fs
      .read_to_string(&manifest_path)
      .map_err(|err| HashError::io(&manifest_path, err))?;
    let entries = serializer
      .parse(&text)
      .map_err(|err| HashError::Manifest {
        path: manifest_path.clone(),
        message: format!("{err:#}"),
      })?;
    for entry in entries {
      keep.insert(normalize_path(
        &target_dir.join(entry.hashed_path.trim_start_matches('/')),
      ));
    }
  }

  let mut report = CleanReport::default();
  for file in hashed_files(fs, &pattern, target_dir)? {
    if keep.contains(&normalize_path(&file)) {
      continue;
    }

    if !window.is_zero() {
      let stat = fs.stat(&file).map_err(|err| HashError::io(&file, err))?;
      let expired = now
        .duration_since(stat.modified)
        .map(|age| age > window)
        .unwrap_or(false);
      if !expired {
        debug!("keeping recent {}", file.display());
        continue;
      }
    }

    delete(fs, &file, &mut report)?;
  }
  Ok(report)
}

fn hashed_files(
  fs: &dyn FileSystem,
  pattern: &HashPattern,
  target_dir: &Path,
) -> HashResult<Vec<PathBuf>> {
  if !fs.exists(target_dir) {
    return Ok(Vec::new());
  }

  let files = fs
    .list_files(target_dir)
    .map_err(|err| HashError::io(target_dir, err))?;
  Ok(
    files
      .into_iter()
      .filter(|file| pattern.is_hashed(file))
      .collect(),
  )
}

fn delete(fs: &dyn FileSystem, path: &Path, report: &mut CleanReport) -> HashResult<()> {
  info!("Deleting {}...", path.display());
  fs.remove(path, false)
    .map_err(|err| HashError::io(path, err))?;
  report.removed.push(path.to_path_buf());
  Ok(())
}
