//! Page rendering pipeline.
//!
//! [`PageRenderer`] runs one page through composition, the synchronous tree
//! render, markdown marker replacement, head extraction, page data
//! serialization and document assembly.

use std::sync::Arc;

use tabi_renderer::HighlighterService;

use crate::compose::{ComposeContext, compose};
use crate::context::{MarkdownConfig, RenderMode};
use crate::document::{DefaultDocument, Document, assemble_document, hydration_body};
use crate::error::{RenderError, TreeError};
use crate::head::extract_head;
use crate::markdown_markers::MarkdownPostProcessor;
use crate::page::{Layout, Page};
use crate::serialize::PageData;

/// One page to render.
#[derive(Clone, Copy)]
pub struct RenderRequest<'a> {
    /// Page to render.
    pub page: &'a Page,
    /// Layout chain, outermost first.
    pub layouts: &'a [Layout],
    /// Route the page is served at.
    pub route: &'a str,
    /// Public URL of the client bundle.
    pub bundle_url: &'a str,
}

/// Renders pages to complete HTML documents.
///
/// Holds the site-wide settings; every call to [`render`](Self::render) is an
/// independent pass sharing only the highlighter.
pub struct PageRenderer<'h> {
    highlighter: &'h HighlighterService,
    base_path: Arc<str>,
    markdown: Arc<MarkdownConfig>,
    document: Arc<dyn Document>,
}

impl<'h> PageRenderer<'h> {
    /// Renderer with base path `/`, default markdown settings and the default
    /// document shell.
    #[must_use]
    pub fn new(highlighter: &'h HighlighterService) -> Self {
        Self {
            highlighter,
            base_path: Arc::from("/"),
            markdown: Arc::new(MarkdownConfig::default()),
            document: Arc::new(DefaultDocument),
        }
    }

    /// Set the base path provided to components and shipped to the client.
    #[must_use]
    pub fn with_base_path(mut self, base_path: &str) -> Self {
        self.base_path = Arc::from(base_path);
        self
    }

    /// Set the markdown presentation settings.
    #[must_use]
    pub fn with_markdown_config(mut self, config: MarkdownConfig) -> Self {
        self.markdown = Arc::new(config);
        self
    }

    /// Set the document shell.
    #[must_use]
    pub fn with_document(mut self, document: Arc<dyn Document>) -> Self {
        self.document = document;
        self
    }

    /// Render `request` to a complete HTML document.
    ///
    /// Output depends only on the request and the renderer's settings, so
    /// rendering the same request twice yields identical documents.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] carrying the route if any stage fails.
    pub async fn render(&self, request: &RenderRequest<'_>) -> Result<String, RenderError> {
        let route = request.route;
        tracing::debug!(route = %route, kind = ?request.page.kind(), "Rendering page");

        let cx = ComposeContext::for_page(
            request.page,
            Arc::clone(&self.base_path),
            Arc::clone(&self.markdown),
        );
        let html = compose(request.page, request.layouts, &cx)
            .render(&RenderMode::Server)
            .map_err(|source| tree_error(route, source))?;

        let processed = MarkdownPostProcessor::new(self.highlighter)
            .with_gfm(self.markdown.gfm)
            .process(&html)
            .await
            .map_err(|source| RenderError::Highlight {
                route: route.to_owned(),
                source,
            })?;

        let extracted = extract_head(&processed.html);

        let data = PageData::new(
            request.page,
            route,
            processed.cache,
            &*self.base_path,
            self.markdown.class_name.clone(),
        );
        let script = data.to_script().map_err(|source| RenderError::Serialize {
            route: route.to_owned(),
            source,
        })?;

        let body = hydration_body(&extracted.body, &script, request.bundle_url);
        let document = assemble_document(self.document.as_ref(), body, &extracted.head)
            .map_err(|source| tree_error(route, source))?;

        tracing::debug!(
            route = %route,
            markdown_blocks = data.markdown_cache.len(),
            bytes = document.len(),
            "Page rendered"
        );
        Ok(document)
    }
}

fn tree_error(route: &str, source: TreeError) -> RenderError {
    RenderError::Tree {
        route: route.to_owned(),
        source,
    }
}

/// Re-render a page on the client side from its shipped page data.
///
/// Markdown comes from the data's cache and head fragments are skipped, so
/// the result equals the content of the server document's hydration root.
///
/// # Errors
///
/// Returns the first [`TreeError`] raised by a component.
pub fn render_client_body(
    page: &Page,
    layouts: &[Layout],
    data: &PageData,
) -> Result<String, TreeError> {
    let cx = ComposeContext {
        frontmatter: Arc::new(data.frontmatter.clone()),
        base_path: Arc::from(data.base_path.as_str()),
        markdown: Arc::new(MarkdownConfig {
            class_name: data.markdown_class_name.clone(),
            ..MarkdownConfig::default()
        }),
    };
    compose(page, layouts, &cx).render(&RenderMode::client(data.markdown_cache.clone()))
}
