//! Markdown rendering, syntax highlighting and HTML escaping for Tabi.
//!
//! This crate provides the leaf pieces of the page pipeline:
//! - [`escape`] / [`unescape`]: the HTML entity codec shared by text nodes,
//!   marker payloads and post-processors
//! - [`Highlighter`] / [`HighlighterService`]: a `syntect` engine built once
//!   per process and shared read-only between renders
//! - [`MarkdownRenderer`]: `pulldown-cmark` HTML output with highlighted code
//!   blocks
//!
//! # Example
//!
//! ```
//! use tabi_renderer::{HighlighterService, MarkdownRenderer};
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let service = HighlighterService::new();
//! let highlighter = service.get().await.unwrap();
//! let html = MarkdownRenderer::new(&highlighter)
//!     .render("# Hello\n\n**Bold** text")
//!     .unwrap();
//! assert!(html.starts_with("<h1>Hello</h1>"));
//! # });
//! ```

mod escape;
mod highlight;
mod markdown;

pub use escape::{escape, unescape};
pub use highlight::{
    DEFAULT_LANGUAGES, DEFAULT_THEME, HighlightError, HighlightOptions, Highlighter,
    HighlighterConfig, HighlighterService, canonical_language,
};
pub use markdown::MarkdownRenderer;
