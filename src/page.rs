//! The single page: one file input, one trigger button, one results region.

pub const INDEX_HTML: &str = include_str!("../static/index.html");
