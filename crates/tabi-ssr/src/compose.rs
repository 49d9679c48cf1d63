//! Composition of a page, its layout chain and ambient context into one tree.

use std::sync::Arc;

use crate::context::{ContextValue, MarkdownConfig, RenderMode};
use crate::error::TreeError;
use crate::marker::markdown_body;
use crate::page::{Frontmatter, Layout, Page, PageContent};
use crate::tree::{Node, render_to_string};

/// Ambient values provided to every component of a composed page.
#[derive(Clone, Debug)]
pub struct ComposeContext {
    /// Page frontmatter.
    pub frontmatter: Arc<Frontmatter>,
    /// URL prefix the site is served under.
    pub base_path: Arc<str>,
    /// Markdown presentation settings.
    pub markdown: Arc<MarkdownConfig>,
}

impl ComposeContext {
    /// Context for `page`, sharing its frontmatter.
    pub fn for_page(page: &Page, base_path: Arc<str>, markdown: Arc<MarkdownConfig>) -> Self {
        Self {
            frontmatter: Arc::clone(page.frontmatter()),
            base_path,
            markdown,
        }
    }
}

/// A composed page tree, renderable any number of times.
#[derive(Clone)]
pub struct Composition {
    root: Node,
}

impl Composition {
    /// Root of the composed tree.
    #[must_use]
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Render the tree in a fresh pass.
    ///
    /// # Errors
    ///
    /// Returns the first [`TreeError`] raised by a component.
    pub fn render(&self, mode: &RenderMode) -> Result<String, TreeError> {
        render_to_string(&self.root, mode)
    }
}

/// Compose `page` inside `layouts`.
///
/// `layouts` runs from the outermost layout to the innermost. The composed
/// tree provides, outermost first, the base path, the markdown config and the
/// frontmatter.
pub fn compose(page: &Page, layouts: &[Layout], cx: &ComposeContext) -> Composition {
    let mut content = match page.content() {
        PageContent::Markdown(body) => markdown_body(body.as_str()),
        PageContent::Component(component) => Node::component(Arc::clone(component), Node::Empty),
    };

    for layout in layouts.iter().rev() {
        content = Node::component(Arc::clone(layout), content);
    }

    let root = Node::provide(
        ContextValue::BasePath(Arc::clone(&cx.base_path)),
        Node::provide(
            ContextValue::MarkdownConfig(Arc::clone(&cx.markdown)),
            Node::provide(
                ContextValue::Frontmatter(Arc::clone(&cx.frontmatter)),
                content,
            ),
        ),
    );

    Composition { root }
}
