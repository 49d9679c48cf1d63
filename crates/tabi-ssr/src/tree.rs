//! Component tree and its HTML string renderer.
//!
//! A [`Node`] tree is rendered synchronously and in document order by
//! [`render_to_string`]. Text nodes and attribute values are escaped; raw
//! nodes are emitted verbatim, which is how markers and pre-rendered HTML
//! bypass escaping.

use std::cell::Cell;
use std::sync::Arc;

use tabi_renderer::escape;

use crate::context::{ContextValue, RenderContext, RenderMode};
use crate::error::TreeError;

/// Elements rendered without a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// A renderable unit: page, layout, document shell or marker emitter.
///
/// `children` is the subtree the component wraps (empty for leaf pages).
pub trait Component: Send + Sync {
    /// Produce the subtree this component stands for.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError`] if the component cannot render, e.g. because it
    /// reads context outside of a provider.
    fn render(&self, cx: &RenderContext<'_>, children: Node) -> Result<Node, TreeError>;
}

impl<F> Component for F
where
    F: Fn(&RenderContext<'_>, Node) -> Result<Node, TreeError> + Send + Sync,
{
    fn render(&self, cx: &RenderContext<'_>, children: Node) -> Result<Node, TreeError> {
        self(cx, children)
    }
}

/// Wrap a closure as a shareable component.
///
/// Pins the closure's signature so its context parameter is inferred as
/// higher-ranked.
pub fn component<F>(f: F) -> Arc<dyn Component>
where
    F: Fn(&RenderContext<'_>, Node) -> Result<Node, TreeError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Node of a component tree.
#[derive(Clone, Default)]
pub enum Node {
    /// Renders nothing.
    #[default]
    Empty,
    /// Text, escaped on output.
    Text(String),
    /// Pre-rendered HTML, emitted verbatim.
    Raw(String),
    /// HTML element.
    Element(Element),
    /// Sequence of siblings.
    Fragment(Vec<Node>),
    /// Component applied to its children.
    Component {
        /// The component.
        component: Arc<dyn Component>,
        /// Subtree passed to the component.
        children: Box<Node>,
    },
    /// Makes a context value visible to `child` and its descendants.
    Provide {
        /// Provided value.
        value: ContextValue,
        /// Subtree that sees the value.
        child: Box<Node>,
    },
}

impl Node {
    /// Text node.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Raw HTML node.
    pub fn raw(html: impl Into<String>) -> Self {
        Self::Raw(html.into())
    }

    /// Fragment of siblings.
    pub fn fragment(nodes: impl IntoIterator<Item = Node>) -> Self {
        Self::Fragment(nodes.into_iter().collect())
    }

    /// Component wrapping `children`.
    pub fn component(component: Arc<dyn Component>, children: impl Into<Node>) -> Self {
        Self::Component {
            component,
            children: Box::new(children.into()),
        }
    }

    /// Provider entry.
    pub fn provide(value: ContextValue, child: impl Into<Node>) -> Self {
        Self::Provide {
            value,
            child: Box::new(child.into()),
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

impl From<String> for Node {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<Node>> for Node {
    fn from(nodes: Vec<Node>) -> Self {
        Self::Fragment(nodes)
    }
}

/// HTML element with attributes and children.
#[derive(Clone)]
pub struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    /// Element with no attributes or children.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Add an attribute. Values are escaped on output.
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    /// Append a child.
    #[must_use]
    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Append several children.
    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    fn is_void(&self) -> bool {
        VOID_ELEMENTS.contains(&self.tag.as_str())
    }
}

/// Render a tree to an HTML string.
///
/// Starts a fresh pass: no providers and a new identity token counter.
///
/// # Errors
///
/// Returns the first [`TreeError`] raised by a component.
pub fn render_to_string(node: &Node, mode: &RenderMode) -> Result<String, TreeError> {
    let next_id = Cell::new(0);
    let cx = RenderContext::root(mode, &next_id);
    cx.render_to_string(node)
}

pub(crate) fn write_node(
    cx: &RenderContext<'_>,
    node: &Node,
    out: &mut String,
) -> Result<(), TreeError> {
    match node {
        Node::Empty => {}
        Node::Text(text) => out.push_str(&escape(text)),
        Node::Raw(html) => out.push_str(html),
        Node::Element(element) => write_element(cx, element, out)?,
        Node::Fragment(nodes) => {
            for node in nodes {
                write_node(cx, node, out)?;
            }
        }
        Node::Component {
            component,
            children,
        } => {
            let rendered = component.render(cx, children.as_ref().clone())?;
            write_node(cx, &rendered, out)?;
        }
        Node::Provide { value, child } => {
            let inner = cx.provide(value);
            write_node(&inner, child, out)?;
        }
    }
    Ok(())
}

fn write_element(
    cx: &RenderContext<'_>,
    element: &Element,
    out: &mut String,
) -> Result<(), TreeError> {
    out.push('<');
    out.push_str(&element.tag);
    for (name, value) in &element.attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape(value));
        out.push('"');
    }

    if element.is_void() {
        out.push_str("/>");
        return Ok(());
    }

    out.push('>');
    for child in &element.children {
        write_node(cx, child, out)?;
    }
    out.push_str("</");
    out.push_str(&element.tag);
    out.push('>');
    Ok(())
}
