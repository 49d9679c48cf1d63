//! Markdown to HTML with highlighted code blocks.

use pulldown_cmark::{CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd, html};

use crate::highlight::{HighlightError, Highlighter};

/// Markdown renderer backed by a shared [`Highlighter`].
///
/// Everything except fenced and indented code blocks goes through
/// `pulldown-cmark`'s HTML writer unchanged; code blocks are replaced by the
/// highlighter's output.
///
/// # Example
///
/// ```
/// use tabi_renderer::{Highlighter, HighlighterConfig, MarkdownRenderer};
///
/// let highlighter = Highlighter::new(&HighlighterConfig::default()).unwrap();
/// let html = MarkdownRenderer::new(&highlighter).render("# Hi").unwrap();
/// assert_eq!(html, "<h1>Hi</h1>\n");
/// ```
pub struct MarkdownRenderer<'h> {
    highlighter: &'h Highlighter,
    gfm: bool,
}

impl<'h> MarkdownRenderer<'h> {
    /// Create a renderer with GFM enabled.
    #[must_use]
    pub fn new(highlighter: &'h Highlighter) -> Self {
        Self {
            highlighter,
            gfm: true,
        }
    }

    /// Enable or disable GitHub Flavored Markdown features.
    ///
    /// GFM is enabled by default. When enabled, the parser supports:
    /// - Tables
    /// - Strikethrough (`~~text~~`)
    /// - Task lists (`- [ ] item`)
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    /// Get parser options based on GFM configuration.
    #[must_use]
    pub fn parser_options(&self) -> Options {
        if self.gfm {
            Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_GFM
        } else {
            Options::empty()
        }
    }

    /// Render markdown text to HTML.
    ///
    /// Output depends only on the input text and the highlighter's fixed
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HighlightError`] if a code block fails to highlight.
    pub fn render(&self, markdown: &str) -> Result<String, HighlightError> {
        let parser = Parser::new_ext(markdown, self.parser_options());

        let mut events: Vec<Event<'_>> = Vec::new();
        let mut code: Option<CodeBlock> = None;

        for event in parser {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => code = Some(CodeBlock::new(&kind)),
                Event::End(TagEnd::CodeBlock) => {
                    if let Some(block) = code.take() {
                        let highlighted = self
                            .highlighter
                            .highlight(&block.source, block.language.as_deref())?;
                        events.push(Event::Html(CowStr::from(highlighted)));
                    }
                }
                Event::Text(text) => match code.as_mut() {
                    Some(block) => block.source.push_str(&text),
                    None => events.push(Event::Text(text)),
                },
                event => events.push(event),
            }
        }

        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, events.into_iter());
        Ok(out)
    }
}

struct CodeBlock {
    language: Option<String>,
    source: String,
}

impl CodeBlock {
    fn new(kind: &CodeBlockKind<'_>) -> Self {
        let language = match kind {
            CodeBlockKind::Fenced(info) => fence_language(info).map(str::to_owned),
            CodeBlockKind::Indented => None,
        };
        Self {
            language,
            source: String::new(),
        }
    }
}

/// Extract the language from a fence info string.
///
/// The language is the first whitespace-separated word; attributes after it
/// (`rust title="main.rs"`) and brace syntax (`{.rust}`) are ignored.
fn fence_language(info: &str) -> Option<&str> {
    let first = info.split_whitespace().next()?;
    let lang = first
        .trim_start_matches('{')
        .trim_start_matches('.')
        .trim_end_matches('}');
    let lang = lang.split(',').next().unwrap_or(lang);
    if lang.is_empty() { None } else { Some(lang) }
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::highlight::HighlighterConfig;

    static HIGHLIGHTER: LazyLock<Highlighter> =
        LazyLock::new(|| Highlighter::new(&HighlighterConfig::default()).unwrap());

    fn render(markdown: &str) -> String {
        MarkdownRenderer::new(&HIGHLIGHTER).render(markdown).unwrap()
    }

    #[test]
    fn test_heading() {
        assert_eq!(render("# Hi"), "<h1>Hi</h1>\n");
    }

    #[test]
    fn test_inline_formatting() {
        assert_eq!(
            render("**Bold** and *italic*"),
            "<p><strong>Bold</strong> and <em>italic</em></p>\n"
        );
    }

    #[test]
    fn test_text_is_escaped() {
        assert_eq!(render("a < b & c"), "<p>a &lt; b &amp; c</p>\n");
    }

    #[test]
    fn test_fenced_code_is_highlighted() {
        let html = render("```rust\nfn main() {}\n```\n");
        assert!(html.contains(r#"<code class="language-rust">"#));
        assert!(html.contains("<span style="));
        assert!(!html.contains("```"));
    }

    #[test]
    fn test_fence_attributes_ignored() {
        let html = render("```python title=\"x.py\"\nprint(1)\n```\n");
        assert!(html.contains(r#"class="language-python""#));
    }

    #[test]
    fn test_indented_code_is_plain() {
        assert_eq!(
            render("    let x = <y>;\n"),
            "<pre class=\"tabi-code\"><code>let x = &lt;y&gt;;\n</code></pre>"
        );
    }

    #[test]
    fn test_gfm_table() {
        let html = render("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>1</td>"));
    }

    #[test]
    fn test_gfm_disabled_strikethrough_literal() {
        let html = MarkdownRenderer::new(&HIGHLIGHTER)
            .with_gfm(false)
            .render("~~gone~~")
            .unwrap();
        assert_eq!(html, "<p>~~gone~~</p>\n");
    }

    #[test]
    fn test_render_is_deterministic() {
        let markdown = "# Title\n\n```json\n{\"a\": [1, 2]}\n```\n\nText.";
        assert_eq!(render(markdown), render(markdown));
    }

    #[test]
    fn test_fence_language() {
        assert_eq!(fence_language("rust"), Some("rust"));
        assert_eq!(fence_language("rust title=\"a\""), Some("rust"));
        assert_eq!(fence_language("{.python}"), Some("python"));
        assert_eq!(fence_language("js,ignore"), Some("js"));
        assert_eq!(fence_language("   "), None);
    }
}
