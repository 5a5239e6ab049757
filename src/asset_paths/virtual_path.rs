use std::path::{Component, Path, PathBuf};

/// Produce the root-relative virtual path for a file below `root`.
///
/// The generated path always uses forward slashes so that the manifest works on every
/// platform, regardless of the native directory separator used when the file was found.
pub fn to_virtual_path(root: &Path, physical: &Path) -> String {
    let relative = relative_to(root, physical).unwrap_or_else(|| physical.to_path_buf());
    format!("/{}", relative.to_string_lossy())
        .replace('\\', "/")
}

/// Path of `physical` relative to `root`, if it lies below it.
pub fn relative_to(root: &Path, physical: &Path) -> Option<PathBuf> {
    normalize_path(physical)
        .strip_prefix(normalize_path(root))
        .ok()
        .map(Path::to_path_buf)
}

/// Whether `path` is `root` itself or lies below it, compared component by component.
pub fn is_descendant(root: &Path, path: &Path) -> bool {
    normalize_path(path).starts_with(normalize_path(root))
}

/// Lexically resolve `.` and `..` components without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                ) && normalized.pop();
                if !popped && !normalized.has_root() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
