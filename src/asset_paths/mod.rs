//! Helpers for resolving and normalising asset paths.
//!
//! Split into focused submodules so that filtering stylesheet references, building
//! root-relative virtual paths and resolving references to physical files can be tested
//! independently.

mod candidates;
mod filters;
mod virtual_path;

pub use candidates::{ReferenceTarget, resolve_reference, split_url_suffix};
pub use filters::should_ignore_asset_reference;
pub use virtual_path::{is_descendant, normalize_path, relative_to, to_virtual_path};
