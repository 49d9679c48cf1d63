//! Server-side page rendering for Tabi.
//!
//! Pages are rendered in two phases. The component tree is first rendered to
//! a string synchronously; content that cannot be finished there is left as
//! marker spans. Markdown markers are then replaced with highlighted HTML,
//! head markers are moved into the document `<head>`, and the state a client
//! needs to reproduce the page is embedded as JSON.
//!
//! This crate provides:
//! - [`Node`] / [`Component`]: the component tree and its string renderer
//! - [`compose`]: a page wrapped in its layout chain and ambient context
//! - [`MarkdownPostProcessor`] and [`extract_head`]: the marker passes
//! - [`PageData`]: the server-to-client wire contract
//! - [`PageRenderer`]: the whole pipeline for one page
//!
//! # Quick Start
//!
//! ```
//! use tabi_renderer::HighlighterService;
//! use tabi_ssr::{Frontmatter, Page, PageData, PageRenderer, RenderRequest};
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let highlighter = HighlighterService::new();
//! let page = Page::markdown(Frontmatter::new(), "# Hi", "index.md");
//!
//! let html = PageRenderer::new(&highlighter)
//!     .render(&RenderRequest {
//!         page: &page,
//!         layouts: &[],
//!         route: "/",
//!         bundle_url: "/client.js",
//!     })
//!     .await
//!     .unwrap();
//!
//! assert!(html.contains("<h1>Hi</h1>"));
//! assert_eq!(PageData::from_document(&html).unwrap().route, "/");
//! # });
//! ```

mod compose;
mod context;
mod document;
mod error;
mod head;
mod markdown_markers;
mod marker;
mod page;
mod pipeline;
mod serialize;
mod tree;

pub use compose::{ComposeContext, Composition, compose};
pub use context::{ContextValue, MarkdownCache, MarkdownConfig, RenderContext, RenderMode};
pub use document::{
    DefaultDocument, Document, DocumentProps, ROOT_ELEMENT_ID, assemble_document, hydration_body,
};
pub use error::{RenderError, SerializeError, TreeError};
pub use head::{ExtractedHead, extract_head};
pub use markdown_markers::{MarkdownPostProcessor, ProcessedMarkdown, process_markdown_markers};
pub use marker::{
    HEAD_TAG, Head, IDENTITY_ATTR, MARKDOWN_TAG, MarkdownBody, Marker, MarkerKind, head,
    head_marker, markdown_body, markdown_marker,
};
pub use page::{Frontmatter, Layout, Page, PageContent, PageKind};
pub use pipeline::{PageRenderer, RenderRequest, render_client_body};
pub use serialize::{DATA_SCRIPT_ID, PageData};
pub use tree::{Component, Element, Node, component, render_to_string};
