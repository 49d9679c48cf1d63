//! Error types for tree rendering, serialization and the page pipeline.

use tabi_renderer::HighlightError;

/// Error raised while evaluating a component tree.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// Context accessor used outside of its provider.
    #[error("{0} accessed outside of its provider")]
    MissingContext(&'static str),
    /// Component-specific failure.
    #[error("Component failed: {0}")]
    Component(String),
}

/// Error encoding or decoding page data.
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    /// JSON encoding or decoding failed.
    #[error("Invalid page data: {0}")]
    Json(#[from] serde_json::Error),
    /// Document has no page data script.
    #[error("Page data script not found")]
    MissingScript,
}

/// Error returned when rendering a page fails.
///
/// Every variant carries the route being rendered.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Component tree failed to render.
    #[error("Failed to render {route}: {source}")]
    Tree {
        /// Route being rendered.
        route: String,
        /// Underlying tree error.
        #[source]
        source: TreeError,
    },
    /// Markdown highlighting failed.
    #[error("Failed to highlight markdown for {route}: {source}")]
    Highlight {
        /// Route being rendered.
        route: String,
        /// Underlying highlighter error.
        #[source]
        source: HighlightError,
    },
    /// Page data could not be serialized.
    #[error("Failed to serialize page data for {route}: {source}")]
    Serialize {
        /// Route being rendered.
        route: String,
        /// Underlying serialization error.
        #[source]
        source: SerializeError,
    },
}

impl RenderError {
    /// Route that failed to render.
    #[must_use]
    pub fn route(&self) -> &str {
        match self {
            Self::Tree { route, .. }
            | Self::Highlight { route, .. }
            | Self::Serialize { route, .. } => route,
        }
    }
}
