#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod asset_paths;
pub mod builder;
pub mod clean;
pub mod config;
pub mod error;
pub mod fs;
pub mod hashing;
pub mod manifest;
pub mod models;
pub mod naming;
pub mod plugins;
pub mod rewrite;
pub mod selection;

pub use builder::AssetHasher;
pub use config::HashOptions;
pub use error::{HashError, HashResult};
pub use fs::{FileSystem, LocalFs};
pub use models::{CleanReport, FileError, Manifest, ManifestEntry, RunReport};
pub use plugins::{Plugin, PluginPipeline};
