//! Text transforms applied to stylesheets and minified bundles before they are hashed.

pub mod css;
pub mod sourcemap;

pub use css::rewrite_css_urls;
pub use sourcemap::{has_pragma_syntax, patch_source_map_pragma};
