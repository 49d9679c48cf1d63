//! Replacement of deferred-markdown markers with highlighted HTML.

use tabi_renderer::{HighlightError, HighlighterService, MarkdownRenderer};

use crate::context::MarkdownCache;
use crate::marker::MarkerKind;

/// Output of [`MarkdownPostProcessor::process`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProcessedMarkdown {
    /// HTML with every markdown marker replaced.
    pub html: String,
    /// Rendered HTML keyed by identity token.
    pub cache: MarkdownCache,
}

/// Renders the markdown carried by deferred-markdown markers.
pub struct MarkdownPostProcessor<'a> {
    highlighter: &'a HighlighterService,
    gfm: bool,
}

impl<'a> MarkdownPostProcessor<'a> {
    /// Processor using `highlighter`, with GFM enabled.
    #[must_use]
    pub fn new(highlighter: &'a HighlighterService) -> Self {
        Self {
            highlighter,
            gfm: true,
        }
    }

    /// Enable or disable GitHub Flavored Markdown.
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    /// Replace every deferred-markdown marker in `html` with rendered HTML.
    ///
    /// Markers are replaced from the last to the first so the byte ranges of
    /// earlier markers stay valid. Input without markers is returned as-is and
    /// the highlighter is not touched.
    ///
    /// # Errors
    ///
    /// Returns [`HighlightError`] if the highlighter cannot be built or a code
    /// block fails to highlight.
    pub async fn process(&self, html: &str) -> Result<ProcessedMarkdown, HighlightError> {
        let markers = MarkerKind::Markdown.scan(html);
        if markers.is_empty() {
            return Ok(ProcessedMarkdown {
                html: html.to_owned(),
                cache: MarkdownCache::new(),
            });
        }

        let highlighter = self.highlighter.get().await?;
        let renderer = MarkdownRenderer::new(&highlighter).with_gfm(self.gfm);

        let mut out = html.to_owned();
        let mut cache = MarkdownCache::new();
        for marker in markers.iter().rev() {
            let rendered = renderer.render(&marker.decode_payload())?;
            out.replace_range(marker.range.clone(), &rendered);
            if let Some(token) = marker.token {
                cache.insert(token.to_owned(), rendered);
            }
            tokio::task::yield_now().await;
        }

        tracing::debug!(markers = markers.len(), "Rendered deferred markdown");
        Ok(ProcessedMarkdown { html: out, cache })
    }
}

/// Replace deferred-markdown markers using `highlighter` with GFM enabled.
///
/// # Errors
///
/// See [`MarkdownPostProcessor::process`].
pub async fn process_markdown_markers(
    html: &str,
    highlighter: &HighlighterService,
) -> Result<ProcessedMarkdown, HighlightError> {
    MarkdownPostProcessor::new(highlighter).process(html).await
}
