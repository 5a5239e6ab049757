use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use asset_fingerprint::{AssetHasher, HashOptions, LocalFs, PluginPipeline};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Copy static assets to content-hashed file names and write a manifest of the mapping.
#[derive(Parser, Debug)]
#[command(name = "fingerprint")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Directory to process (defaults to the current directory)
  source: Option<PathBuf>,

  /// Directory receiving hashed copies (defaults to SOURCE)
  target: Option<PathBuf>,

  /// Log every file as it is processed
  #[arg(short, long)]
  verbose: bool,

  /// Delete the manifest and every hashed file in TARGET
  #[arg(short, long)]
  clean: bool,

  /// Delete hashed files no longer in the manifest once older than this many days
  #[arg(long, value_name = "DAYS", conflicts_with = "clean")]
  clean_old: Option<u64>,

  /// Options file (defaults to fingerprint.config.json in SOURCE)
  #[arg(long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Globs of files to skip
  #[arg(short, long, value_delimiter = ',')]
  exclude: Vec<String>,

  /// Globs of files to process; everything else is skipped
  #[arg(long, value_delimiter = ',')]
  include: Vec<String>,

  /// Globs of files copied to TARGET without hashing
  #[arg(long, value_delimiter = ',')]
  passthrough: Vec<String>,

  /// Manifest format: json, tab, json-object or json-symfony
  #[arg(short, long)]
  manifest_format: Option<String>,

  /// Manifest location (defaults to TARGET/manifest.<ext>)
  #[arg(long)]
  manifest_path: Option<PathBuf>,

  /// Record per-file errors and keep going
  #[arg(short, long)]
  ignore_errors: bool,

  /// Skip a failing plugin instead of failing the file
  #[arg(long)]
  ignore_plugin_errors: bool,

  /// Do not rewrite url() references in stylesheets
  #[arg(short, long)]
  skip_css: bool,

  /// Do not hash sourcemaps or patch sourceMappingURL pragmas
  #[arg(long)]
  skip_map: bool,

  /// Keep unchanged entries from the previous manifest
  #[arg(short, long)]
  amend: bool,

  /// Hash binary files by size instead of content
  #[arg(short, long)]
  quickhash: bool,

  /// Directory virtual paths are relative to (defaults to SOURCE)
  #[arg(short, long)]
  base_dir: Option<PathBuf>,

  /// Prefix for patched sourceMappingURL values
  #[arg(long)]
  sourcemap_url_prefix: Option<String>,

  /// Reference hashed sourcemaps by file name only
  #[arg(long)]
  sourcemap_basename_only: bool,

  /// Plugins to leave out
  #[arg(long, value_delimiter = ',')]
  disabled_plugins: Vec<String>,

  /// Number of hash characters in file names
  #[arg(short = 'l', long)]
  hash_length: Option<usize>,

  /// Hashed file name template, e.g. "{basename}.{hash}{extname}"
  #[arg(short = 'f', long)]
  rename_format: Option<String>,
}

impl Cli {
  /// Layer the command-line flags over options loaded from disk.
  fn apply(&self, options: &mut HashOptions, cwd: &Path) {
    options.exclude.extend(self.exclude.iter().cloned());
    options.include.extend(self.include.iter().cloned());
    options.passthrough.extend(self.passthrough.iter().cloned());
    options
      .disabled_plugins
      .extend(self.disabled_plugins.iter().cloned());

    if let Some(format) = &self.manifest_format {
      options.manifest_format = format.clone();
    }
    if let Some(path) = &self.manifest_path {
      options.manifest_path = Some(cwd.join(path));
    }
    if let Some(dir) = &self.base_dir {
      options.base_dir = Some(cwd.join(dir));
    }
    if let Some(prefix) = &self.sourcemap_url_prefix {
      options.sourcemap_url_prefix = prefix.clone();
    }
    if let Some(format) = &self.rename_format {
      options.rename_format = format.clone();
    }
    if self.hash_length.is_some() {
      options.hash_length = self.hash_length;
    }
    if self.clean_old.is_some() {
      options.clean_old_days = self.clean_old;
    }

    options.continue_on_error |= self.ignore_errors;
    options.continue_on_plugin_error |= self.ignore_plugin_errors;
    options.process_css &= !self.skip_css;
    options.process_map &= !self.skip_map;
    options.quick_hash |= self.quickhash;
    options.amend |= self.amend;
    options.sourcemap_basename_only |= self.sourcemap_basename_only;
  }
}

fn main() -> Result<ExitCode> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "info" };
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
    )
    .with_target(false)
    .init();

  let cwd = std::env::current_dir().context("failed to read the current directory")?;
  let source_dir = cli
    .source
    .as_ref()
    .map(|dir| cwd.join(dir))
    .unwrap_or_else(|| cwd.clone());
  let target_dir = cli
    .target
    .as_ref()
    .map(|dir| cwd.join(dir))
    .unwrap_or_else(|| source_dir.clone());

  let mut options = match &cli.config {
    Some(path) => HashOptions::from_path(&cwd.join(path))
      .with_context(|| format!("failed to load options from {}", path.display()))?,
    None => HashOptions::discover(&source_dir),
  };
  cli.apply(&mut options, &cwd);

  let fs = LocalFs::new();
  let plugins = PluginPipeline::builtin(&options);
  let hasher = AssetHasher::new(&options, &fs, &plugins);

  if cli.clean {
    hasher
      .clean(&target_dir)
      .with_context(|| format!("failed to clean {}", target_dir.display()))?;
    return Ok(ExitCode::SUCCESS);
  }

  if cli.clean_old.is_some() {
    hasher
      .clean_old(&target_dir)
      .with_context(|| format!("failed to clean {}", target_dir.display()))?;
    return Ok(ExitCode::SUCCESS);
  }

  let piped = piped_files(&cwd)?;
  let report = if piped.is_empty() {
    hasher.process_directory(&source_dir, &target_dir)
  } else {
    hasher.process_files(&piped, &source_dir, &target_dir)
  }
  .with_context(|| format!("failed to process {}", source_dir.display()))?;

  Ok(if report.is_success() {
    ExitCode::SUCCESS
  } else {
    ExitCode::FAILURE
  })
}

/// File paths piped on stdin, one per line, resolved against `cwd`.
fn piped_files(cwd: &Path) -> Result<Vec<PathBuf>> {
  let mut stdin = io::stdin();
  if stdin.is_terminal() {
    return Ok(Vec::new());
  }

  let mut input = String::new();
  stdin
    .read_to_string(&mut input)
    .context("failed to read file list from stdin")?;

  Ok(
    input
      .lines()
      .map(str::trim)
      .filter(|line| !line.is_empty())
      .map(|line| cwd.join(line))
      .collect(),
  )
}
