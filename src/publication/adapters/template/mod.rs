//! File-backed templates rendered with `minijinja`.

mod registry;
mod renderer;

pub use registry::{MANIFEST_FILE, TemplateLoadError, TemplateRegistry};
pub use renderer::{MinijinjaRenderer, compact_html, format_dutch_date};
