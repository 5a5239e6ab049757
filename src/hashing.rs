//! Content digests used to build hashed file names.

use std::path::Path;

use md5::{Digest, Md5};

use crate::error::{HashError, HashResult};
use crate::fs::FileSystem;

/// Extensions treated as opaque binaries by quick-hash mode.
const BINARY_EXTENSIONS: &[&str] = &[
  "pdf", "jpg", "jpeg", "png", "gif", "bmp", "tiff", "webp", "ico",
];

/// Computes MD5 hex digests of file contents or text.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentHasher {
  quick: bool,
}

impl ContentHasher {
  /// Create a hasher. In quick mode recognised binaries are hashed by size only.
  pub fn new(quick: bool) -> Self {
    Self { quick }
  }

  /// Digest of a file on disk.
  ///
  /// Quick mode trades collision resistance for speed: two distinct binaries of the same
  /// length share a digest.
  pub fn digest_file(&self, fs: &dyn FileSystem, path: &Path) -> HashResult<String> {
    if self.quick && is_binary(path) {
      let stat = fs.stat(path).map_err(|err| HashError::io(path, err))?;
      return Ok(digest_bytes(stat.len.to_string().as_bytes()));
    }

    let bytes = fs.read(path).map_err(|err| HashError::io(path, err))?;
    Ok(digest_bytes(&bytes))
  }

  /// Digest of already-transformed text, so the name reflects output bytes.
  pub fn digest_text(&self, text: &str) -> String {
    digest_bytes(text.as_bytes())
  }
}

/// Lowercase hex MD5 of `bytes`.
pub fn digest_bytes(bytes: &[u8]) -> String {
  format!("{:x}", Md5::digest(bytes))
}

fn is_binary(path: &Path) -> bool {
  path
    .extension()
    .and_then(|ext| ext.to_str())
    .map(|ext| BINARY_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
    .unwrap_or(false)
}
