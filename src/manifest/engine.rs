//! Per-file resolution for one fingerprinting run.
//!
//! Every candidate goes through the same steps whether it came from the file list, a
//! stylesheet `url()` or a sourcemap sidecar. Resolved entries are memoized by physical
//! path, so each file is hashed and written at most once per run.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use same_file::is_same_file;
use tracing::{debug, error, info, warn};

use crate::asset_paths::{
  is_descendant, normalize_path, relative_to, resolve_reference, to_virtual_path,
};
use crate::config::HashOptions;
use crate::error::{HashError, HashResult};
use crate::fs::FileSystem;
use crate::hashing::ContentHasher;
use crate::models::{FileError, Manifest, ManifestEntry};
use crate::naming::HashPattern;
use crate::plugins::PluginPipeline;
use crate::rewrite::{has_pragma_syntax, patch_source_map_pragma, rewrite_css_urls};
use crate::selection::{PathClass, PathSelection};

const MAP_EXTENSION: &str = "map";

/// Terminal outcome of resolving one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
  /// Already hashed, filtered out, or a sourcemap handled alongside its owner.
  Skipped,
  /// Copied verbatim to the target tree without a manifest entry.
  Passthrough,
  /// Entry resolved earlier in this run, or confirmed unchanged since the previous manifest.
  Cached(usize),
  /// Entry computed and written by this resolution.
  Resolved(usize),
  /// Failure recorded in the manifest's error list.
  Failed,
}

impl Resolution {
  /// Index into [`Manifest::entries`] of the entry behind this outcome.
  pub fn entry_index(self) -> Option<usize> {
    match self {
      Self::Cached(index) | Self::Resolved(index) => Some(index),
      _ => None,
    }
  }
}

/// How a file reached the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
  Listed,
  Reference,
  Sidecar,
}

/// Inputs shared by every resolution in a run. Nothing in here changes once a run starts.
pub struct RunContext<'a> {
  options: &'a HashOptions,
  fs: &'a dyn FileSystem,
  plugins: &'a PluginPipeline,
  pattern: HashPattern,
  selection: PathSelection,
  hasher: ContentHasher,
  base_dir: PathBuf,
  target_dir: PathBuf,
  mirrored: bool,
}

impl<'a> RunContext<'a> {
  /// Compile the naming template and glob lists held by `options`.
  ///
  /// Fails with a configuration error before any file is touched.
  pub fn new(
    options: &'a HashOptions,
    fs: &'a dyn FileSystem,
    plugins: &'a PluginPipeline,
    base_dir: &Path,
    target_dir: &Path,
  ) -> HashResult<Self> {
    let pattern = HashPattern::compile(&options.rename_format, options.hash_length)?;
    let selection = PathSelection::from_options(options)?;
    let base_dir = normalize_path(base_dir);
    let target_dir = normalize_path(target_dir);
    let mirrored = !same_directory(&base_dir, &target_dir);

    Ok(Self {
      options,
      fs,
      plugins,
      pattern,
      selection,
      hasher: ContentHasher::new(options.quick_hash),
      base_dir,
      target_dir,
      mirrored,
    })
  }

  /// Compiled hashed-name template.
  pub fn pattern(&self) -> &HashPattern {
    &self.pattern
  }

  /// Directory virtual paths are relative to.
  pub fn base_dir(&self) -> &Path {
    &self.base_dir
  }

  /// Directory hashed copies are written under.
  pub fn target_dir(&self) -> &Path {
    &self.target_dir
  }

  /// True when hashed copies go to a different tree than the originals.
  pub fn is_mirrored(&self) -> bool {
    self.mirrored
  }
}

fn same_directory(a: &Path, b: &Path) -> bool {
  is_same_file(a, b).unwrap_or_else(|_| a == b)
}

/// Mutable state of one run: the manifest under construction, the lookup table keyed by
/// physical path, and the set of paths that already failed.
pub struct ManifestEngine<'c, 'a> {
  context: &'c RunContext<'a>,
  manifest: Manifest,
  lookup: HashMap<PathBuf, usize>,
  failed: HashSet<PathBuf>,
  in_progress: HashSet<PathBuf>,
}

impl<'c, 'a> ManifestEngine<'c, 'a> {
  /// Start an empty run.
  pub fn new(context: &'c RunContext<'a>) -> Self {
    Self {
      context,
      manifest: Manifest::default(),
      lookup: HashMap::new(),
      failed: HashSet::new(),
      in_progress: HashSet::new(),
    }
  }

  /// Seed the run with entries parsed from a previous manifest.
  ///
  /// Seeded entries are unverified: the first resolution of their file recomputes them, and
  /// entries whose file is never revisited are carried over as they are.
  pub fn seed(&mut self, previous: Vec<ManifestEntry>) {
    for mut entry in previous {
      entry.expand_physical(&self.context.base_dir, &self.context.target_dir);
      entry.unverified = true;
      let key = normalize_path(&entry.physical_path);
      if self.lookup.contains_key(&key) {
        continue;
      }
      self.manifest.entries.push(entry);
      self.lookup.insert(key, self.manifest.entries.len() - 1);
    }
  }

  /// Resolve one listed file.
  ///
  /// Per-file failures are recorded and reported as [`Resolution::Failed`] when the options
  /// allow continuing; otherwise the first failure is returned.
  pub fn resolve(&mut self, path: &Path) -> HashResult<Resolution> {
    self.resolve_from(path, Origin::Listed)
  }

  /// Manifest accumulated so far.
  pub fn manifest(&self) -> &Manifest {
    &self.manifest
  }

  /// Finish the run and hand back the manifest.
  pub fn into_manifest(self) -> Manifest {
    self.manifest
  }

  fn resolve_from(&mut self, path: &Path, origin: Origin) -> HashResult<Resolution> {
    let path = normalize_path(path);

    if let Some(&index) = self.lookup.get(&path) {
      if !self.manifest.entries[index].unverified {
        debug!(path = %path.display(), "already resolved");
        return Ok(Resolution::Cached(index));
      }
    }

    if self.failed.contains(&path) {
      return Ok(Resolution::Failed);
    }

    if !self.in_progress.insert(path.clone()) {
      debug!(path = %path.display(), "reference cycle, leaving it unresolved");
      return Ok(Resolution::Skipped);
    }
    let outcome = self.compute(&path, origin);
    self.in_progress.remove(&path);

    match outcome {
      Ok(resolution) => Ok(resolution),
      Err(err) if self.context.options.continue_on_error && !err.is_configuration() => {
        error!(path = %path.display(), "{err}");
        self.manifest.errors.push(FileError {
          path: path.clone(),
          message: err.to_string(),
        });
        self.failed.insert(path);
        Ok(Resolution::Failed)
      }
      Err(err) => Err(err),
    }
  }

  fn compute(&mut self, path: &Path, origin: Origin) -> HashResult<Resolution> {
    let context = self.context;
    let fs = context.fs;
    let options = context.options;

    if !is_descendant(&context.base_dir, path) {
      return Err(HashError::PathEscape {
        path: path.to_path_buf(),
        base: context.base_dir.clone(),
      });
    }

    if context.pattern.is_hashed(path) {
      debug!(path = %path.display(), "skipping already hashed file");
      return Ok(Resolution::Skipped);
    }

    let relative = relative_to(&context.base_dir, path).unwrap_or_default();
    let mut class = context
      .selection
      .classify(&selection_name(&relative), context.mirrored);
    if class == PathClass::Excluded {
      debug!(path = %path.display(), "filtered out");
      return Ok(Resolution::Skipped);
    }

    if origin != Origin::Sidecar {
      match self.owner_class(path) {
        Some(PathClass::Included) => {
          debug!(path = %path.display(), "sourcemap is handled with its owner");
          return Ok(Resolution::Skipped);
        }
        Some(PathClass::Passthrough) => class = PathClass::Passthrough,
        Some(PathClass::Excluded) | None => {}
      }
    }

    if class == PathClass::Passthrough {
      let destination = context.target_dir.join(&relative);
      fs
        .copy(path, &destination)
        .map_err(|err| HashError::io(path, err))?;
      info!("{} > {} (passthrough)", path.display(), destination.display());
      return Ok(Resolution::Passthrough);
    }

    let (hash_code, mut content) = if options.process_css && has_extension(path, "css") {
      let css = fs
        .read_to_string(path)
        .map_err(|err| HashError::io(path, err))?;
      let rewritten = rewrite_css_urls(&css, |reference| self.rewrite_reference(path, reference))?;
      (context.hasher.digest_text(&rewritten), Some(rewritten))
    } else {
      (context.hasher.digest_file(fs, path)?, None)
    };

    let output_dir = match relative.parent() {
      Some(parent) => context.target_dir.join(parent),
      None => context.target_dir.clone(),
    };
    let hashed_physical_path = context.pattern.render(path, &output_dir, &hash_code);

    let previous = self.lookup.get(path).copied();
    if let Some(index) = previous {
      let entry = &mut self.manifest.entries[index];
      if normalize_path(&entry.hashed_physical_path) == hashed_physical_path {
        entry.unverified = false;
        debug!(path = %path.display(), "unchanged since the previous manifest");
        return Ok(Resolution::Cached(index));
      }
    }

    if options.process_map {
      content = self.patch_sidecar_reference(path, content)?;
    }

    match &content {
      Some(text) => fs.write(&hashed_physical_path, text.as_bytes()),
      None => fs.copy(path, &hashed_physical_path),
    }
    .map_err(|err| HashError::io(&hashed_physical_path, err))?;
    info!("{} > {}", path.display(), hashed_physical_path.display());

    let mut entry = ManifestEntry {
      path: to_virtual_path(&context.base_dir, path),
      hashed_path: to_virtual_path(&context.target_dir, &hashed_physical_path),
      physical_path: path.to_path_buf(),
      hashed_physical_path,
      hash_code,
      transformed_content: content,
      ..ManifestEntry::default()
    };
    context
      .plugins
      .apply(&mut entry, fs, options.continue_on_plugin_error)?;

    let index = match previous {
      Some(index) => {
        self.manifest.entries[index] = entry;
        index
      }
      None => {
        self.manifest.entries.push(entry);
        self.manifest.entries.len() - 1
      }
    };
    self.lookup.insert(path.to_path_buf(), index);
    Ok(Resolution::Resolved(index))
  }

  /// Resolver handed to the stylesheet rewriter for one `url()` reference.
  fn rewrite_reference(&mut self, stylesheet: &Path, reference: &str) -> HashResult<String> {
    let context = self.context;
    let target = resolve_reference(&context.base_dir, stylesheet, reference);

    if !context.fs.exists(&target.physical) {
      warn!(
        stylesheet = %stylesheet.display(),
        reference,
        "stylesheet reference does not resolve to a file"
      );
      return Ok(reference.to_string());
    }

    let resolution = self.resolve_from(&target.physical, Origin::Reference)?;
    let Some(index) = resolution.entry_index() else {
      return Ok(reference.to_string());
    };

    Ok(target.with_file_name(&file_name(
      &self.manifest.entries[index].hashed_physical_path,
    )))
  }

  /// Resolve the `.map` sibling of `path` and point the pragma in its output at it.
  ///
  /// Returns the output text, which is `content` unchanged when there is nothing to patch.
  fn patch_sidecar_reference(
    &mut self,
    path: &Path,
    content: Option<String>,
  ) -> HashResult<Option<String>> {
    let context = self.context;
    let extension = extension_of(path);
    let map_path = sidecar_path(path);
    if !has_pragma_syntax(&extension) || !context.fs.exists(&map_path) {
      return Ok(content);
    }

    let resolution = self.resolve_from(&map_path, Origin::Sidecar)?;
    let Some(index) = resolution.entry_index() else {
      return Ok(content);
    };

    let map_entry = &self.manifest.entries[index];
    let reference = if context.options.sourcemap_basename_only {
      file_name(&map_entry.hashed_physical_path)
    } else {
      map_entry.hashed_path.clone()
    };

    let text = match content {
      Some(text) => text,
      None => context
        .fs
        .read_to_string(path)
        .map_err(|err| HashError::io(path, err))?,
    };

    Ok(patch_source_map_pragma(
      &extension,
      &text,
      &reference,
      &context.options.sourcemap_url_prefix,
    ))
  }

  /// Class of the file a `.map` sidecar belongs to (the same path without `.map`).
  ///
  /// `None` when `path` is not a map, when its owner is missing or already hashed, or when
  /// the owner has no pragma to patch. Those maps are resolved on their own.
  fn owner_class(&self, path: &Path) -> Option<PathClass> {
    let context = self.context;
    if !context.options.process_map || !has_extension(path, MAP_EXTENSION) {
      return None;
    }

    let owner = path.with_extension("");
    if !has_pragma_syntax(&extension_of(&owner))
      || !context.fs.exists(&owner)
      || context.pattern.is_hashed(&owner)
    {
      return None;
    }

    let relative = relative_to(&context.base_dir, &owner)?;
    Some(
      context
        .selection
        .classify(&selection_name(&relative), context.mirrored),
    )
  }
}

/// Forward-slash form of a base-relative path, as the selection globs expect it.
fn selection_name(relative: &Path) -> String {
  relative.to_string_lossy().replace('\\', "/")
}

fn sidecar_path(path: &Path) -> PathBuf {
  let mut name = path.as_os_str().to_os_string();
  name.push(".");
  name.push(MAP_EXTENSION);
  PathBuf::from(name)
}

fn extension_of(path: &Path) -> String {
  path
    .extension()
    .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
    .unwrap_or_default()
}

fn has_extension(path: &Path, extension: &str) -> bool {
  extension_of(path) == extension
}

fn file_name(path: &Path) -> String {
  path
    .file_name()
    .map(|name| name.to_string_lossy().into_owned())
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::fs::LocalFs;
  use crate::hashing::digest_bytes;
  use crate::models::EntryFields;
  use crate::plugins::Plugin;
  use std::fs;
  use tempfile::tempdir;

  struct Fixture {
    _temp: tempfile::TempDir,
    source: PathBuf,
    target: PathBuf,
  }

  fn fixture(files: &[(&str, &str)]) -> Fixture {
    let temp = tempdir().unwrap();
    let source = temp.path().join("src");
    let target = temp.path().join("out");
    fs::create_dir_all(&source).unwrap();
    for (relative, contents) in files {
      let path = source.join(relative);
      fs::create_dir_all(path.parent().unwrap()).unwrap();
      fs::write(path, contents).unwrap();
    }
    Fixture {
      _temp: temp,
      source,
      target,
    }
  }

  fn run(fixture: &Fixture, options: &HashOptions, files: &[&str]) -> HashResult<Manifest> {
    let plugins = PluginPipeline::default();
    let fs = LocalFs::new();
    let context = RunContext::new(options, &fs, &plugins, &fixture.source, &fixture.target)?;
    let mut engine = ManifestEngine::new(&context);
    for file in files {
      engine.resolve(&fixture.source.join(file))?;
    }
    Ok(engine.into_manifest())
  }

  fn hashed_name(stem: &str, contents: &str, extension: &str) -> String {
    format!("{stem}-hc{}{extension}", digest_bytes(contents.as_bytes()))
  }

  #[test]
  fn copies_files_to_hashed_names_in_the_mirrored_tree() {
    let fixture = fixture(&[("img/logo.png", "png-bytes")]);
    let manifest = run(&fixture, &HashOptions::default(), &["img/logo.png"]).unwrap();

    let entry = manifest.get("/img/logo.png").unwrap();
    let name = hashed_name("logo", "png-bytes", ".png");
    assert_eq!(entry.hashed_path, format!("/img/{name}"));
    assert_eq!(
      fs::read_to_string(fixture.target.join("img").join(&name)).unwrap(),
      "png-bytes"
    );
  }

  #[test]
  fn stylesheet_names_depend_on_referenced_assets() {
    let css = "a{background:url(../img/a.png)}";
    let first = fixture(&[("css/app.css", css), ("img/a.png", "one")]);
    let second = fixture(&[("css/app.css", css), ("img/a.png", "two")]);

    let one = run(&first, &HashOptions::default(), &["css/app.css"]).unwrap();
    let two = run(&second, &HashOptions::default(), &["css/app.css"]).unwrap();

    let css_one = one.get("/css/app.css").unwrap();
    let css_two = two.get("/css/app.css").unwrap();
    assert_ne!(css_one.hashed_path, css_two.hashed_path);
    assert!(one.get("/img/a.png").is_some());

    let image = hashed_name("a", "one", ".png");
    let written = fs::read_to_string(first.target.join(css_one.hashed_path.trim_start_matches('/')))
      .unwrap();
    assert_eq!(written, format!("a{{background:url(../img/{image})}}"));
    assert_eq!(css_one.hash_code, digest_bytes(written.as_bytes()));
  }

  #[test]
  fn root_relative_references_resolve_against_the_base_directory() {
    let fixture = fixture(&[
      ("css/site/app.css", "a{background:url('/img/a.png?v=1')}"),
      ("img/a.png", "img"),
    ]);
    let manifest = run(&fixture, &HashOptions::default(), &["css/site/app.css"]).unwrap();

    let css = manifest.get("/css/site/app.css").unwrap();
    let image = hashed_name("a", "img", ".png");
    assert_eq!(
      css.transformed_content.as_deref(),
      Some(format!("a{{background:url('/img/{image}?v=1')}}").as_str())
    );
  }

  #[test]
  fn referenced_assets_are_resolved_once() {
    let fixture = fixture(&[
      ("a.css", "a{background:url(shared.png)}"),
      ("b.css", "b{background:url(shared.png)}"),
      ("shared.png", "shared"),
    ]);
    let manifest =
      run(&fixture, &HashOptions::default(), &["a.css", "b.css", "shared.png"]).unwrap();

    let shared: Vec<_> = manifest
      .entries
      .iter()
      .filter(|entry| entry.path == "/shared.png")
      .collect();
    assert_eq!(shared.len(), 1);
    assert_eq!(manifest.entries.len(), 3);
  }

  #[test]
  fn unresolved_references_are_left_untouched() {
    let css = "a{background:url(missing.png)} b{background:url(https://x/y.png)}";
    let fixture = fixture(&[("app.css", css)]);
    let manifest = run(&fixture, &HashOptions::default(), &["app.css"]).unwrap();

    let entry = manifest.get("/app.css").unwrap();
    assert_eq!(entry.transformed_content.as_deref(), Some(css));
  }

  #[test]
  fn css_processing_can_be_disabled() {
    let fixture = fixture(&[("app.css", "a{background:url(a.png)}"), ("a.png", "x")]);
    let options = HashOptions {
      process_css: false,
      ..HashOptions::default()
    };
    let manifest = run(&fixture, &options, &["app.css"]).unwrap();

    assert!(manifest.get("/a.png").is_none());
    let entry = manifest.get("/app.css").unwrap();
    assert_eq!(entry.hash_code, digest_bytes(b"a{background:url(a.png)}"));
  }

  #[test]
  fn skips_hashed_and_excluded_files() {
    let hashed = format!("app-hc{}.js", digest_bytes(b"x"));
    let fixture = fixture(&[(hashed.as_str(), "x"), ("notes.txt", "t")]);
    let options = HashOptions {
      exclude: vec!["*.txt".into()],
      ..HashOptions::default()
    };
    let plugins = PluginPipeline::default();
    let fs = LocalFs::new();
    let context =
      RunContext::new(&options, &fs, &plugins, &fixture.source, &fixture.target).unwrap();
    let mut engine = ManifestEngine::new(&context);

    assert_eq!(
      engine.resolve(&fixture.source.join(&hashed)).unwrap(),
      Resolution::Skipped
    );
    assert_eq!(
      engine.resolve(&fixture.source.join("notes.txt")).unwrap(),
      Resolution::Skipped
    );
    assert!(engine.manifest().entries.is_empty());
  }

  #[test]
  fn repeated_resolution_hits_the_cache() {
    let fixture = fixture(&[("a.js", "let a;")]);
    let plugins = PluginPipeline::default();
    let fs = LocalFs::new();
    let options = HashOptions::default();
    let context =
      RunContext::new(&options, &fs, &plugins, &fixture.source, &fixture.target).unwrap();
    let mut engine = ManifestEngine::new(&context);

    let path = fixture.source.join("a.js");
    assert_eq!(engine.resolve(&path).unwrap(), Resolution::Resolved(0));
    assert_eq!(engine.resolve(&path).unwrap(), Resolution::Cached(0));
    let dotted = fixture.source.join("sub/../a.js");
    assert_eq!(engine.resolve(&dotted).unwrap(), Resolution::Cached(0));
  }

  #[test]
  fn passthrough_copies_without_an_entry() {
    let fixture = fixture(&[("index.html", "<html></html>")]);
    let options = HashOptions {
      passthrough: vec!["*.html".into()],
      ..HashOptions::default()
    };
    let manifest = run(&fixture, &options, &["index.html"]).unwrap();

    assert!(manifest.entries.is_empty());
    assert_eq!(
      fs::read_to_string(fixture.target.join("index.html")).unwrap(),
      "<html></html>"
    );
  }

  #[test]
  fn passthrough_is_ignored_when_hashing_in_place() {
    let fixture = fixture(&[("index.html", "<html></html>")]);
    let options = HashOptions {
      passthrough: vec!["*.html".into()],
      ..HashOptions::default()
    };
    let plugins = PluginPipeline::default();
    let fs = LocalFs::new();
    let context =
      RunContext::new(&options, &fs, &plugins, &fixture.source, &fixture.source).unwrap();
    assert!(!context.is_mirrored());

    let mut engine = ManifestEngine::new(&context);
    let resolution = engine.resolve(&fixture.source.join("index.html")).unwrap();
    assert_eq!(resolution, Resolution::Resolved(0));
  }

  #[test]
  fn escaping_the_base_directory_is_a_file_failure() {
    let fixture = fixture(&[("app.css", "a{background:url(../outside.png)}")]);
    fs::write(fixture.source.parent().unwrap().join("outside.png"), "x").unwrap();

    let strict = run(&fixture, &HashOptions::default(), &["app.css"]).unwrap_err();
    assert!(matches!(strict, HashError::PathEscape { .. }));

    let options = HashOptions {
      continue_on_error: true,
      ..HashOptions::default()
    };
    let manifest = run(&fixture, &options, &["app.css"]).unwrap();
    assert_eq!(manifest.errors.len(), 1);
    assert!(manifest.errors[0].path.ends_with("outside.png"));
    let css = manifest.get("/app.css").unwrap();
    assert_eq!(
      css.transformed_content.as_deref(),
      Some("a{background:url(../outside.png)}")
    );
  }

  #[test]
  fn failed_paths_are_recorded_once() {
    let fixture = fixture(&[
      ("a.css", "a{background:url(../x.png)}"),
      ("b.css", "b{background:url(../x.png)}"),
    ]);
    fs::write(fixture.source.parent().unwrap().join("x.png"), "x").unwrap();
    let options = HashOptions {
      continue_on_error: true,
      ..HashOptions::default()
    };
    let manifest = run(&fixture, &options, &["a.css", "b.css"]).unwrap();
    assert_eq!(manifest.errors.len(), 1);
    assert_eq!(manifest.entries.len(), 2);
  }

  #[test]
  fn patches_sourcemap_pragmas_to_the_hashed_map() {
    let js = "console.log(1);\n//# sourceMappingURL=app.js.map\n";
    let fixture = fixture(&[("js/app.js", js), ("js/app.js.map", r#"{"version":3}"#)]);
    let manifest = run(&fixture, &HashOptions::default(), &["js/app.js", "js/app.js.map"]).unwrap();

    let map_name = hashed_name("app.js", r#"{"version":3}"#, ".map");
    let map = manifest.get("/js/app.js.map").unwrap();
    assert_eq!(map.hashed_path, format!("/js/{map_name}"));

    let entry = manifest.get("/js/app.js").unwrap();
    assert_eq!(entry.hash_code, digest_bytes(js.as_bytes()));
    let written =
      fs::read_to_string(fixture.target.join(entry.hashed_path.trim_start_matches('/'))).unwrap();
    assert_eq!(
      written,
      format!("console.log(1);\n//# sourceMappingURL=/js/{map_name}\n")
    );
    assert_eq!(manifest.entries.len(), 2);
  }

  #[test]
  fn sourcemap_reference_honours_prefix_and_basename_options() {
    let css = "a{}\n/*# sourceMappingURL=app.css.map */\n";
    let fixture = fixture(&[("app.css", css), ("app.css.map", "{}")]);
    let options = HashOptions {
      sourcemap_basename_only: true,
      sourcemap_url_prefix: "https://cdn.example/".into(),
      ..HashOptions::default()
    };
    let manifest = run(&fixture, &options, &["app.css"]).unwrap();

    let map_name = hashed_name("app.css", "{}", ".map");
    let entry = manifest.get("/app.css").unwrap();
    assert_eq!(
      entry.transformed_content.as_deref(),
      Some(format!("a{{}}\n/*# sourceMappingURL=https://cdn.example/{map_name} */\n").as_str())
    );
  }

  #[test]
  fn orphan_maps_are_hashed_like_any_file() {
    let fixture = fixture(&[("lonely.js.map", "{}")]);
    let manifest = run(&fixture, &HashOptions::default(), &["lonely.js.map"]).unwrap();
    assert!(manifest.get("/lonely.js.map").is_some());
  }

  #[test]
  fn maps_of_passthrough_files_are_copied_with_them() {
    let js = "vendor();\n//# sourceMappingURL=vendor.js.map\n";
    let fixture = fixture(&[("vendor.js", js), ("vendor.js.map", "{}")]);
    let options = HashOptions {
      passthrough: vec!["vendor.js".into()],
      ..HashOptions::default()
    };
    let plugins = PluginPipeline::default();
    let fs = LocalFs::new();
    let context =
      RunContext::new(&options, &fs, &plugins, &fixture.source, &fixture.target).unwrap();
    let mut engine = ManifestEngine::new(&context);

    for file in ["vendor.js", "vendor.js.map"] {
      assert_eq!(
        engine.resolve(&fixture.source.join(file)).unwrap(),
        Resolution::Passthrough
      );
    }
    assert!(engine.manifest().entries.is_empty());
    assert_eq!(fs::read_to_string(fixture.target.join("vendor.js")).unwrap(), js);
    assert_eq!(
      fs::read_to_string(fixture.target.join("vendor.js.map")).unwrap(),
      "{}"
    );
  }

  #[test]
  fn maps_of_files_without_pragmas_are_hashed_on_their_own() {
    let fixture = fixture(&[("data.json", "[]"), ("data.json.map", "{}")]);
    let manifest = run(&fixture, &HashOptions::default(), &["data.json", "data.json.map"]).unwrap();

    let map_name = hashed_name("data.json", "{}", ".map");
    let map = manifest.get("/data.json.map").unwrap();
    assert_eq!(map.hashed_path, format!("/{map_name}"));
    assert!(fixture.target.join(&map_name).exists());
    assert_eq!(manifest.entries.len(), 2);
  }

  #[test]
  fn maps_of_excluded_files_are_hashed_on_their_own() {
    let fixture = fixture(&[("app.js", "run();"), ("app.js.map", "{}")]);
    let options = HashOptions {
      exclude: vec!["*.js".into()],
      ..HashOptions::default()
    };
    let manifest = run(&fixture, &options, &["app.js", "app.js.map"]).unwrap();

    assert!(manifest.get("/app.js").is_none());
    let map_name = hashed_name("app.js", "{}", ".map");
    assert_eq!(
      manifest.get("/app.js.map").unwrap().hashed_path,
      format!("/{map_name}")
    );
    assert!(fixture.target.join(&map_name).exists());
  }

  #[test]
  fn maps_of_already_hashed_files_are_hashed_on_their_own() {
    let owner = format!("app-hc{}.js", digest_bytes(b"run();"));
    let map = format!("{owner}.map");
    let fixture = fixture(&[(owner.as_str(), "run();"), (map.as_str(), "{}")]);
    let manifest = run(&fixture, &HashOptions::default(), &[owner.as_str(), map.as_str()]).unwrap();

    assert_eq!(manifest.entries.len(), 1);
    let entry = manifest.get(&format!("/{map}")).unwrap();
    assert_eq!(entry.hashed_path, format!("/{}", hashed_name(&owner, "{}", ".map")));
  }

  #[test]
  fn seeded_entries_are_kept_when_unchanged() {
    let fixture = fixture(&[("a.js", "let a;"), ("b.js", "let b;")]);
    let a_name = hashed_name("a", "let a;", ".js");
    let previous = vec![
      ManifestEntry {
        path: "/a.js".into(),
        hashed_path: format!("/{a_name}"),
        fields: EntryFields::from_iter([("kept".to_string(), serde_json::json!(true))]),
        ..ManifestEntry::default()
      },
      ManifestEntry {
        path: "/b.js".into(),
        hashed_path: "/b-hc00000000000000000000000000000000.js".into(),
        ..ManifestEntry::default()
      },
      ManifestEntry {
        path: "/gone.js".into(),
        hashed_path: "/gone-hc00000000000000000000000000000000.js".into(),
        ..ManifestEntry::default()
      },
    ];

    let plugins = PluginPipeline::default();
    let fs = LocalFs::new();
    let options = HashOptions::default();
    let context =
      RunContext::new(&options, &fs, &plugins, &fixture.source, &fixture.target).unwrap();
    let mut engine = ManifestEngine::new(&context);
    engine.seed(previous);

    assert_eq!(
      engine.resolve(&fixture.source.join("a.js")).unwrap(),
      Resolution::Cached(0)
    );
    assert_eq!(
      engine.resolve(&fixture.source.join("b.js")).unwrap(),
      Resolution::Resolved(1)
    );
    let manifest = engine.into_manifest();

    assert!(!fixture.target.join(&a_name).exists());
    assert_eq!(manifest.entries[0].field("kept"), Some(serde_json::json!(true)));
    assert!(!manifest.entries[0].unverified);
    assert_eq!(
      manifest.entries[1].hashed_path,
      format!("/{}", hashed_name("b", "let b;", ".js"))
    );
    assert!(manifest.entries[2].unverified);
    assert_eq!(manifest.entries.len(), 3);
  }

  struct Failing;

  impl Plugin for Failing {
    fn name(&self) -> &str {
      "failing"
    }

    fn process_file(
      &self,
      _entry: &ManifestEntry,
      _fs: &dyn FileSystem,
    ) -> anyhow::Result<EntryFields> {
      anyhow::bail!("nope")
    }
  }

  #[test]
  fn escalated_plugin_failures_leave_no_entry() {
    let fixture = fixture(&[("a.js", "let a;")]);
    let plugins = PluginPipeline::new(vec![Box::new(Failing)]);
    let fs = LocalFs::new();
    let options = HashOptions {
      continue_on_error: true,
      ..HashOptions::default()
    };
    let context =
      RunContext::new(&options, &fs, &plugins, &fixture.source, &fixture.target).unwrap();
    let mut engine = ManifestEngine::new(&context);

    let resolution = engine.resolve(&fixture.source.join("a.js")).unwrap();
    assert_eq!(resolution, Resolution::Failed);
    let manifest = engine.into_manifest();
    assert!(manifest.entries.is_empty());
    assert!(manifest.errors[0].message.contains("failing"));
  }

  #[test]
  fn tolerated_plugin_failures_keep_the_entry() {
    let fixture = fixture(&[("a.js", "let a;")]);
    let plugins = PluginPipeline::new(vec![Box::new(Failing)]);
    let fs = LocalFs::new();
    let options = HashOptions {
      continue_on_plugin_error: true,
      ..HashOptions::default()
    };
    let context =
      RunContext::new(&options, &fs, &plugins, &fixture.source, &fixture.target).unwrap();
    let mut engine = ManifestEngine::new(&context);

    let resolution = engine.resolve(&fixture.source.join("a.js")).unwrap();
    assert_eq!(resolution, Resolution::Resolved(0));
  }

  #[test]
  fn self_referencing_stylesheets_terminate() {
    let fixture = fixture(&[("a.css", "@import url(a.css);")]);
    let manifest = run(&fixture, &HashOptions::default(), &["a.css"]).unwrap();
    let entry = manifest.get("/a.css").unwrap();
    assert_eq!(entry.transformed_content.as_deref(), Some("@import url(a.css);"));
  }
}
