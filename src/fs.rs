//! Synchronous filesystem port used by the manifest engine and the cleanup passes.
//!
//! The engine never touches `std::fs` directly; it goes through [`FileSystem`] so that
//! every read, write, copy and delete happens in a predictable order and can be swapped in
//! tests.

use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use walkdir::WalkDir;

/// Size and modification time of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
  /// Length in bytes.
  pub len: u64,
  /// Last modification time.
  pub modified: SystemTime,
}

/// Abstract filesystem interface.
pub trait FileSystem {
  /// Read a file into memory.
  fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

  /// Read a UTF-8 file into a string.
  fn read_to_string(&self, path: &Path) -> io::Result<String>;

  /// Write a file, creating parent directories as needed.
  fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

  /// Copy a file, creating parent directories as needed.
  fn copy(&self, from: &Path, to: &Path) -> io::Result<()>;

  /// Delete a file. Missing files are ignored unless `must_exist` is set.
  fn remove(&self, path: &Path, must_exist: bool) -> io::Result<()>;

  /// Size and modification time.
  fn stat(&self, path: &Path) -> io::Result<FileStat>;

  /// Whether anything exists at `path`.
  fn exists(&self, path: &Path) -> bool;

  /// Every regular file below `root`, depth first, in name order.
  fn list_files(&self, root: &Path) -> io::Result<Vec<PathBuf>>;
}

/// [`FileSystem`] backed by the local disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl LocalFs {
  /// Create a new local filesystem handle.
  pub fn new() -> Self {
    Self
  }
}

impl FileSystem for LocalFs {
  fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
    fs::read(path)
  }

  fn read_to_string(&self, path: &Path) -> io::Result<String> {
    fs::read_to_string(path)
  }

  fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
    ensure_parent(path)?;
    fs::write(path, contents)
  }

  fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
    ensure_parent(to)?;
    fs::copy(from, to).map(|_| ())
  }

  fn remove(&self, path: &Path, must_exist: bool) -> io::Result<()> {
    match fs::remove_file(path) {
      Ok(()) => Ok(()),
      Err(err) if err.kind() == ErrorKind::NotFound && !must_exist => Ok(()),
      Err(err) => Err(err),
    }
  }

  fn stat(&self, path: &Path) -> io::Result<FileStat> {
    let metadata = fs::metadata(path)?;
    Ok(FileStat {
      len: metadata.len(),
      modified: metadata.modified()?,
    })
  }

  fn exists(&self, path: &Path) -> bool {
    path.exists()
  }

  fn list_files(&self, root: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
      let entry = entry.map_err(io::Error::from)?;
      if entry.file_type().is_file() {
        files.push(entry.into_path());
      }
    }
    Ok(files)
  }
}

fn ensure_parent(path: &Path) -> io::Result<()> {
  match path.parent() {
    Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
    _ => Ok(()),
  }
}
