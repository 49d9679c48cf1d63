//! Render mode and the context threaded through a render pass.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::TreeError;
use crate::page::Frontmatter;
use crate::tree::{Node, write_node};

/// Rendered markdown keyed by identity token.
///
/// Ordered so serialized page data is byte-stable.
pub type MarkdownCache = BTreeMap<String, String>;

/// Markdown presentation settings shared by every markdown body in a page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarkdownConfig {
    /// Class added to each markdown container element.
    pub class_name: Option<String>,
    /// Enable GitHub Flavored Markdown extensions.
    pub gfm: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            class_name: None,
            gfm: true,
        }
    }
}

/// Which side of the wire a tree is rendered for.
#[derive(Clone, Debug, Default)]
pub enum RenderMode {
    /// Initial delivery: deferred content is emitted as markers.
    #[default]
    Server,
    /// Re-render from serialized page data: markdown comes from the cache and
    /// head fragments are skipped.
    Client {
        /// Cache shipped with the page.
        cache: Arc<MarkdownCache>,
    },
}

impl RenderMode {
    /// Client mode over `cache`.
    #[must_use]
    pub fn client(cache: MarkdownCache) -> Self {
        Self::Client {
            cache: Arc::new(cache),
        }
    }
}

/// Value made available to a subtree by a [`Node::Provide`] entry.
#[derive(Clone)]
pub enum ContextValue {
    /// URL prefix the site is served under.
    BasePath(Arc<str>),
    /// Markdown presentation settings.
    MarkdownConfig(Arc<MarkdownConfig>),
    /// Page frontmatter.
    Frontmatter(Arc<Frontmatter>),
}

#[derive(Clone, Default)]
struct Scope {
    base_path: Option<Arc<str>>,
    markdown: Option<Arc<MarkdownConfig>>,
    frontmatter: Option<Arc<Frontmatter>>,
}

/// Per-component view of the render pass.
///
/// Carries the render mode, the values of enclosing providers, and the
/// pass-wide identity token counter.
pub struct RenderContext<'a> {
    mode: &'a RenderMode,
    next_id: &'a Cell<usize>,
    scope: Scope,
}

impl<'a> RenderContext<'a> {
    pub(crate) fn root(mode: &'a RenderMode, next_id: &'a Cell<usize>) -> Self {
        Self {
            mode,
            next_id,
            scope: Scope::default(),
        }
    }

    pub(crate) fn provide(&self, value: &ContextValue) -> Self {
        let mut scope = self.scope.clone();
        match value {
            ContextValue::BasePath(path) => scope.base_path = Some(Arc::clone(path)),
            ContextValue::MarkdownConfig(config) => scope.markdown = Some(Arc::clone(config)),
            ContextValue::Frontmatter(frontmatter) => {
                scope.frontmatter = Some(Arc::clone(frontmatter));
            }
        }
        Self {
            mode: self.mode,
            next_id: self.next_id,
            scope,
        }
    }

    /// Render mode of this pass.
    #[must_use]
    pub fn mode(&self) -> &RenderMode {
        self.mode
    }

    /// Frontmatter of the page being rendered.
    ///
    /// Every caller within one pass receives the same `Arc`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::MissingContext`] outside a frontmatter provider.
    pub fn frontmatter(&self) -> Result<&Arc<Frontmatter>, TreeError> {
        self.scope
            .frontmatter
            .as_ref()
            .ok_or(TreeError::MissingContext("frontmatter"))
    }

    /// Base path of the site.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::MissingContext`] outside a base-path provider.
    pub fn base_path(&self) -> Result<&str, TreeError> {
        self.scope
            .base_path
            .as_deref()
            .ok_or(TreeError::MissingContext("base path"))
    }

    /// Markdown presentation settings.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::MissingContext`] outside a markdown-config provider.
    pub fn markdown_config(&self) -> Result<&Arc<MarkdownConfig>, TreeError> {
        self.scope
            .markdown
            .as_ref()
            .ok_or(TreeError::MissingContext("markdown config"))
    }

    /// Allocate an identity token unique within this render pass.
    ///
    /// Tokens are handed out in render order, so a server pass and a client
    /// pass over the same tree agree on them.
    pub fn next_identity_token(&self) -> String {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        format!("tabi-{id}")
    }

    /// Render a subtree to HTML within this context.
    ///
    /// Shares providers and the identity counter with the enclosing pass.
    ///
    /// # Errors
    ///
    /// Returns the first [`TreeError`] raised while rendering `node`.
    pub fn render_to_string(&self, node: &Node) -> Result<String, TreeError> {
        let mut out = String::new();
        write_node(self, node, &mut out)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_sequential_and_unique() {
        let counter = Cell::new(0);
        let mode = RenderMode::Server;
        let cx = RenderContext::root(&mode, &counter);
        let nested = cx.provide(&ContextValue::BasePath(Arc::from("/")));

        assert_eq!(cx.next_identity_token(), "tabi-0");
        assert_eq!(nested.next_identity_token(), "tabi-1");
        assert_eq!(cx.next_identity_token(), "tabi-2");
    }

    #[test]
    fn test_missing_providers_error() {
        let counter = Cell::new(0);
        let mode = RenderMode::Server;
        let cx = RenderContext::root(&mode, &counter);

        assert!(matches!(
            cx.frontmatter(),
            Err(TreeError::MissingContext("frontmatter"))
        ));
        assert!(matches!(
            cx.base_path(),
            Err(TreeError::MissingContext("base path"))
        ));
        assert!(matches!(
            cx.markdown_config(),
            Err(TreeError::MissingContext("markdown config"))
        ));
    }

    #[test]
    fn test_provide_shares_arc() {
        let counter = Cell::new(0);
        let mode = RenderMode::Server;
        let frontmatter = Arc::new(Frontmatter::new());
        let cx = RenderContext::root(&mode, &counter)
            .provide(&ContextValue::Frontmatter(Arc::clone(&frontmatter)))
            .provide(&ContextValue::BasePath(Arc::from("/docs")));

        assert!(Arc::ptr_eq(cx.frontmatter().unwrap(), &frontmatter));
        assert_eq!(cx.base_path().unwrap(), "/docs");
    }

    #[test]
    fn test_inner_provider_shadows_outer() {
        let counter = Cell::new(0);
        let mode = RenderMode::Server;
        let cx = RenderContext::root(&mode, &counter)
            .provide(&ContextValue::BasePath(Arc::from("/outer")))
            .provide(&ContextValue::BasePath(Arc::from("/inner")));

        assert_eq!(cx.base_path().unwrap(), "/inner");
    }
}
