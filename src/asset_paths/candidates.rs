use std::path::{Path, PathBuf};

use super::virtual_path::normalize_path;

/// Physical location a stylesheet reference points at, plus the pieces needed to write the
/// hashed reference back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceTarget {
    /// Physical file the reference resolves to.
    pub physical: PathBuf,
    /// Everything up to and including the last `/` of the reference, kept verbatim.
    pub directory_prefix: String,
}

impl ReferenceTarget {
    /// Rebuild the reference so it names `hashed_file_name` in the same directory.
    pub fn with_file_name(&self, hashed_file_name: &str) -> String {
        format!("{}{}", self.directory_prefix, hashed_file_name)
    }
}

/// Split a reference into its path and any trailing `?query` or `#fragment`.
///
/// The suffix is returned verbatim so that it can be reattached after resolution.
pub fn split_url_suffix(url: &str) -> (&str, &str) {
    match url.find(['?', '#']) {
        Some(index) => url.split_at(index),
        None => (url, ""),
    }
}

/// Resolve a stylesheet reference to a physical path.
///
/// Root-relative references (`/img/a.png`) are resolved against `base_dir`; everything else
/// is resolved against the directory of the referencing stylesheet.
pub fn resolve_reference(base_dir: &Path, stylesheet: &Path, reference: &str) -> ReferenceTarget {
    let directory_prefix = match reference.rfind('/') {
        Some(index) => reference[..=index].to_string(),
        None => String::new(),
    };

    let physical = match reference.strip_prefix('/') {
        Some(rooted) => base_dir.join(rooted),
        None => stylesheet
            .parent()
            .map(|dir| dir.join(reference))
            .unwrap_or_else(|| PathBuf::from(reference)),
    };

    ReferenceTarget {
        physical: normalize_path(&physical),
        directory_prefix,
    }
}
