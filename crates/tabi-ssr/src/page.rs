//! Pages and layouts: the inputs of composition.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tree::Component;

/// Page metadata as an arbitrary key/value map.
pub type Frontmatter = serde_json::Map<String, Value>;

/// Layout component. Receives the wrapped content as its children.
pub type Layout = Arc<dyn Component>;

/// How a page's content is authored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    /// Markdown text, rendered through the highlighting engine.
    Markdown,
    /// Component tree.
    Component,
}

/// Content of a page.
#[derive(Clone)]
pub enum PageContent {
    /// Raw markdown body (frontmatter already removed).
    Markdown(String),
    /// Page component.
    Component(Arc<dyn Component>),
}

impl fmt::Debug for PageContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Markdown(text) => f.debug_tuple("Markdown").field(text).finish(),
            Self::Component(_) => f.write_str("Component(..)"),
        }
    }
}

/// A page ready to render. Immutable once built.
#[derive(Clone, Debug)]
pub struct Page {
    frontmatter: Arc<Frontmatter>,
    content: PageContent,
    source_path: PathBuf,
}

impl Page {
    /// Markdown page.
    pub fn markdown(
        frontmatter: Frontmatter,
        body: impl Into<String>,
        source_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            frontmatter: Arc::new(frontmatter),
            content: PageContent::Markdown(body.into()),
            source_path: source_path.into(),
        }
    }

    /// Component page.
    pub fn component(
        frontmatter: Frontmatter,
        component: Arc<dyn Component>,
        source_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            frontmatter: Arc::new(frontmatter),
            content: PageContent::Component(component),
            source_path: source_path.into(),
        }
    }

    /// Kind of page content.
    #[must_use]
    pub fn kind(&self) -> PageKind {
        match self.content {
            PageContent::Markdown(_) => PageKind::Markdown,
            PageContent::Component(_) => PageKind::Component,
        }
    }

    /// Shared frontmatter.
    #[must_use]
    pub fn frontmatter(&self) -> &Arc<Frontmatter> {
        &self.frontmatter
    }

    /// Page content.
    #[must_use]
    pub fn content(&self) -> &PageContent {
        &self.content
    }

    /// Path of the source file the page was built from.
    #[must_use]
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }
}
