//! Document shell and final document assembly.

use crate::context::RenderMode;
use crate::error::TreeError;
use crate::tree::{Element, Node, render_to_string};

/// Id of the element the client bundle hydrates.
pub const ROOT_ELEMENT_ID: &str = "__tabi__";

/// Input of a [`Document`] shell.
#[derive(Clone, Default)]
pub struct DocumentProps {
    /// Extra head content. The assembler passes `None` and splices the
    /// extracted head itself.
    pub head: Option<Node>,
    /// Body content, including the hydration root and scripts.
    pub body: Node,
}

/// Outer HTML shell of every page.
pub trait Document: Send + Sync {
    /// Build the `<html>` tree around `props`.
    ///
    /// The tree must contain a `</head>` for extracted head content to be
    /// inserted.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError`] if the shell cannot be built.
    fn render(&self, props: DocumentProps) -> Result<Node, TreeError>;
}

impl<F> Document for F
where
    F: Fn(DocumentProps) -> Result<Node, TreeError> + Send + Sync,
{
    fn render(&self, props: DocumentProps) -> Result<Node, TreeError> {
        self(props)
    }
}

/// Shell used when none is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultDocument;

impl Document for DefaultDocument {
    fn render(&self, props: DocumentProps) -> Result<Node, TreeError> {
        let head = Element::new("head")
            .child(Element::new("meta").attr("charset", "utf-8"))
            .child(
                Element::new("meta")
                    .attr("name", "viewport")
                    .attr("content", "width=device-width, initial-scale=1"),
            )
            .child(props.head.unwrap_or_default());

        Ok(Element::new("html")
            .attr("lang", "en")
            .child(head)
            .child(Element::new("body").child(props.body))
            .into())
    }
}

/// Body handed to the shell: the hydration root holding `body_html`, then
/// the page data script and the client bundle.
pub fn hydration_body(body_html: &str, data_script: &str, bundle_url: &str) -> Node {
    Node::fragment([
        Element::new("div")
            .attr("id", ROOT_ELEMENT_ID)
            .child(Node::raw(body_html))
            .into(),
        Node::raw(data_script),
        Element::new("script")
            .attr("type", "module")
            .attr("src", bundle_url)
            .into(),
    ])
}

/// Render `document` around `body`, splice `head` in and add the doctype.
///
/// `head` goes immediately before the first `</head>`. A shell without
/// `</head>` is returned as rendered and `head` is dropped.
///
/// # Errors
///
/// Returns [`TreeError`] if the shell fails to render.
pub fn assemble_document(
    document: &dyn Document,
    body: Node,
    head: &str,
) -> Result<String, TreeError> {
    let shell = document.render(DocumentProps { head: None, body })?;
    let mut html = render_to_string(&shell, &RenderMode::Server)?;

    if !head.is_empty()
        && let Some(pos) = html.find("</head>")
    {
        html.insert_str(pos, head);
    }

    Ok(format!("<!DOCTYPE html>{html}"))
}
