//! Error types shared by the manifest engine, the serializers and the cleanup passes.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type HashResult<T> = Result<T, HashError>;

/// Failures raised while fingerprinting a tree of assets.
#[derive(Error, Debug)]
pub enum HashError {
  /// The source directory handed to a run does not exist.
  #[error("the source directory '{}' doesn't exist", path.display())]
  SourceMissing {
    /// Directory that was expected to exist.
    path: PathBuf,
  },

  /// No serializer is registered under the requested manifest format.
  #[error("manifest format '{format}' is not known")]
  UnknownFormat {
    /// Requested format name.
    format: String,
  },

  /// An include, exclude or passthrough glob failed to compile.
  #[error("invalid file pattern '{pattern}': {message}")]
  InvalidPattern {
    /// Offending pattern text.
    pattern: String,
    /// Parser message.
    message: String,
  },

  /// The hashed-name template cannot be rendered or recognised.
  #[error("invalid rename format '{template}': {message}")]
  InvalidTemplate {
    /// Offending template text.
    template: String,
    /// Why the template was rejected.
    message: String,
  },

  /// A resolved file lies outside the declared base directory.
  #[error("the file '{}' is not in the base directory: '{}'", path.display(), base.display())]
  PathEscape {
    /// Resolved physical path.
    path: PathBuf,
    /// Base directory the path must descend from.
    base: PathBuf,
  },

  /// A plugin failed while enriching a manifest entry.
  #[error("plugin '{plugin}' failed on '{}': {message}", path.display())]
  Plugin {
    /// Plugin name.
    plugin: String,
    /// File the plugin was processing.
    path: PathBuf,
    /// Plugin failure message.
    message: String,
  },

  /// Reading, writing, copying or deleting a file failed.
  #[error("I/O error on '{}': {source}", path.display())]
  Io {
    /// File the operation targeted.
    path: PathBuf,
    /// Underlying I/O error.
    #[source]
    source: std::io::Error,
  },

  /// A persisted manifest could not be serialized or parsed.
  #[error("manifest '{}' is unreadable: {message}", path.display())]
  Manifest {
    /// Manifest location.
    path: PathBuf,
    /// Serializer message.
    message: String,
  },
}

impl HashError {
  /// Wrap an I/O failure with the path it concerned.
  pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    Self::Io {
      path: path.into(),
      source,
    }
  }

  /// Returns `true` for failures detected before any file is processed.
  ///
  /// Configuration failures always abort a run, regardless of the continue-on-error policy.
  pub fn is_configuration(&self) -> bool {
    matches!(
      self,
      Self::SourceMissing { .. }
        | Self::UnknownFormat { .. }
        | Self::InvalidPattern { .. }
        | Self::InvalidTemplate { .. }
    )
  }
}
