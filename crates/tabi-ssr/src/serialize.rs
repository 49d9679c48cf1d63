//! Page data shipped to the client inside the document.
//!
//! The data travels as JSON in a non-executable
//! `<script id="__TABI_DATA__" type="application/json">` element. Every `<`
//! and `>` in the JSON is written as a `\u003c`/`\u003e` escape, which JSON
//! decodes back to the same characters, so no value can close the script
//! element early.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::context::MarkdownCache;
use crate::error::SerializeError;
use crate::page::{Frontmatter, Page, PageKind};

/// Id of the page data script element.
pub const DATA_SCRIPT_ID: &str = "__TABI_DATA__";

static DATA_SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<script id="__TABI_DATA__" type="application/json">(.*?)</script>"#)
        .unwrap()
});

/// State a client needs to re-render a page without the highlighter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageData {
    /// Page frontmatter.
    pub frontmatter: Frontmatter,
    /// Route the page was rendered for.
    pub route: String,
    /// How the page content is authored.
    pub page_type: PageKind,
    /// Rendered markdown keyed by identity token.
    pub markdown_cache: MarkdownCache,
    /// URL prefix the site is served under.
    pub base_path: String,
    /// Class of markdown containers, if configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markdown_class_name: Option<String>,
}

impl PageData {
    /// Page data for `page` rendered at `route`.
    pub fn new(
        page: &Page,
        route: impl Into<String>,
        markdown_cache: MarkdownCache,
        base_path: impl Into<String>,
        markdown_class_name: Option<String>,
    ) -> Self {
        Self {
            frontmatter: page.frontmatter().as_ref().clone(),
            route: route.into(),
            page_type: page.kind(),
            markdown_cache,
            base_path: base_path.into(),
            markdown_class_name,
        }
    }

    /// Encode as the page data script element.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError::Json`] if encoding fails.
    pub fn to_script(&self) -> Result<String, SerializeError> {
        let json = escape_json_for_script(&serde_json::to_string(self)?);
        Ok(format!(
            r#"<script id="{DATA_SCRIPT_ID}" type="application/json">{json}</script>"#
        ))
    }

    /// Decode the page data script found in a delivered document.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError::MissingScript`] if the document has no page
    /// data script, or [`SerializeError::Json`] if its content is invalid.
    pub fn from_document(html: &str) -> Result<Self, SerializeError> {
        let json = DATA_SCRIPT_RE
            .captures(html)
            .and_then(|caps| caps.get(1))
            .ok_or(SerializeError::MissingScript)?;
        Ok(serde_json::from_str(json.as_str())?)
    }
}

fn escape_json_for_script(json: &str) -> String {
    json.replace('<', "\\u003c").replace('>', "\\u003e")
}
