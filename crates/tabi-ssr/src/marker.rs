//! Deferred-content markers.
//!
//! Content that cannot be finished during the synchronous tree render is
//! emitted as a marker span, `<TAG ...>ESCAPED_PAYLOAD</TAG>`, and processed
//! in a later pass:
//!
//! - `deferred-markdown` carries markdown source that still needs rendering
//!   and highlighting. The opening tag holds the identity token of the
//!   [`MarkdownBody`] that emitted it; a bare `<deferred-markdown>` span
//!   without the attribute is still rendered but has no cache entry.
//! - `deferred-head` carries an HTML fragment that belongs in the document
//!   `<head>`.
//!
//! Payloads are always fully escaped, so a payload never contains `<` and
//! marker spans cannot nest or overlap.

use std::ops::Range;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tabi_renderer::{escape, unescape};

use crate::context::{RenderContext, RenderMode};
use crate::error::TreeError;
use crate::tree::{Component, Element, Node};

/// Tag name of deferred-markdown markers.
pub const MARKDOWN_TAG: &str = "deferred-markdown";

/// Tag name of deferred-head markers.
pub const HEAD_TAG: &str = "deferred-head";

/// Attribute carrying the identity token on markdown containers and markers.
pub const IDENTITY_ATTR: &str = "data-markdown-id";

static MARKDOWN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)<deferred-markdown(?: data-markdown-id="([^"]*)")?>(.*?)</deferred-markdown>"#,
    )
    .unwrap()
});

static HEAD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<deferred-head>(.*?)</deferred-head>").unwrap());

/// Encode a deferred-markdown marker.
pub fn markdown_marker(token: &str, markdown: &str) -> String {
    format!(
        "<{MARKDOWN_TAG} {IDENTITY_ATTR}=\"{}\">{}</{MARKDOWN_TAG}>",
        escape(token),
        escape(markdown)
    )
}

/// Encode a deferred-head marker.
pub fn head_marker(html: &str) -> String {
    format!("<{HEAD_TAG}>{}</{HEAD_TAG}>", escape(html))
}

/// Kind of marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkerKind {
    /// `deferred-markdown`.
    Markdown,
    /// `deferred-head`.
    Head,
}

impl MarkerKind {
    /// Tag name of this kind.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Markdown => MARKDOWN_TAG,
            Self::Head => HEAD_TAG,
        }
    }

    /// Find every marker of this kind in `html`, in document order.
    pub fn scan(self, html: &str) -> Vec<Marker<'_>> {
        match self {
            Self::Markdown => MARKDOWN_RE
                .captures_iter(html)
                .filter_map(|caps| {
                    let span = caps.get(0)?;
                    Some(Marker {
                        kind: self,
                        range: span.range(),
                        token: caps.get(1).map(|m| m.as_str()),
                        payload: caps.get(2).map_or("", |m| m.as_str()),
                    })
                })
                .collect(),
            Self::Head => HEAD_RE
                .captures_iter(html)
                .filter_map(|caps| {
                    let span = caps.get(0)?;
                    Some(Marker {
                        kind: self,
                        range: span.range(),
                        token: None,
                        payload: caps.get(1).map_or("", |m| m.as_str()),
                    })
                })
                .collect(),
        }
    }
}

/// One marker occurrence found by [`MarkerKind::scan`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Marker<'a> {
    /// Marker kind.
    pub kind: MarkerKind,
    /// Byte range of the whole span, tags included.
    pub range: Range<usize>,
    /// Identity token, for markdown markers that carry one.
    pub token: Option<&'a str>,
    /// Escaped payload.
    pub payload: &'a str,
}

impl Marker<'_> {
    /// Payload with escaping reversed.
    #[must_use]
    pub fn decode_payload(&self) -> String {
        unescape(self.payload)
    }
}

/// Container for a markdown body.
///
/// On the server it holds a deferred-markdown marker; on the client it holds
/// the cached HTML for its identity token, or nothing if the cache has no
/// entry.
pub struct MarkdownBody {
    markdown: String,
}

impl MarkdownBody {
    /// Body for raw markdown text.
    pub fn new(markdown: impl Into<String>) -> Self {
        Self {
            markdown: markdown.into(),
        }
    }
}

impl Component for MarkdownBody {
    fn render(&self, cx: &RenderContext<'_>, _children: Node) -> Result<Node, TreeError> {
        let token = cx.next_identity_token();

        let mut container = Element::new("div").attr(IDENTITY_ATTR, token.as_str());
        if let Some(class) = cx
            .markdown_config()
            .ok()
            .and_then(|config| config.class_name.as_deref())
        {
            container = container.attr("class", class);
        }

        let content = match cx.mode() {
            RenderMode::Server => Node::Raw(markdown_marker(&token, &self.markdown)),
            RenderMode::Client { cache } => {
                cache.get(&token).cloned().map(Node::Raw).unwrap_or_default()
            }
        };
        Ok(container.child(content).into())
    }
}

/// Fragment relocated into the document `<head>`.
///
/// On the server its children are rendered and wrapped in a deferred-head
/// marker. On the client it renders nothing, though the children are still
/// evaluated so identity tokens are allocated the same way on both sides.
pub struct Head;

impl Component for Head {
    fn render(&self, cx: &RenderContext<'_>, children: Node) -> Result<Node, TreeError> {
        let html = cx.render_to_string(&children)?;
        match cx.mode() {
            RenderMode::Server => Ok(Node::Raw(head_marker(&html))),
            RenderMode::Client { .. } => Ok(Node::Empty),
        }
    }
}

/// Node rendering `markdown` through a [`MarkdownBody`].
pub fn markdown_body(markdown: impl Into<String>) -> Node {
    Node::component(Arc::new(MarkdownBody::new(markdown)), Node::Empty)
}

/// Node relocating `children` into the document head.
pub fn head(children: impl Into<Node>) -> Node {
    Node::component(Arc::new(Head), children)
}
