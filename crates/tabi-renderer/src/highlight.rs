//! Syntax highlighting for fenced code blocks.
//!
//! [`Highlighter`] wraps a `syntect` grammar bundle and theme. Building one is
//! expensive (the whole grammar bundle is deserialized), so pages share a
//! single instance through [`HighlighterService`], which constructs it lazily
//! on the first [`get`](HighlighterService::get) and freezes its
//! configuration from then on.

use std::collections::BTreeSet;
use std::fmt::Write;
use std::sync::{Arc, LazyLock};

use syntect::easy::HighlightLines;
use syntect::highlighting::{Color, Theme, ThemeSet};
use syntect::html::{IncludeBackground, styled_line_to_highlighted_html};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;
use tokio::sync::Mutex;

use crate::escape::escape;

/// Theme used when none is configured.
pub const DEFAULT_THEME: &str = "InspiredGitHub";

/// Languages highlighted out of the box.
pub const DEFAULT_LANGUAGES: &[&str] = &[
    "bash",
    "c",
    "cpp",
    "css",
    "diff",
    "go",
    "html",
    "java",
    "javascript",
    "json",
    "markdown",
    "python",
    "ruby",
    "rust",
    "sql",
    "xml",
    "yaml",
];

/// Error returned when highlighting fails.
#[derive(Debug, thiserror::Error)]
pub enum HighlightError {
    /// The configured theme is not part of the bundled theme set.
    #[error("Unknown highlighting theme: {0}")]
    UnknownTheme(String),
    /// Grammar evaluation or HTML generation failed.
    #[error("Highlighting failed: {0}")]
    Syntect(#[from] syntect::Error),
    /// The background construction task panicked or was cancelled.
    #[error("Highlighter construction task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Caller-supplied highlighter settings.
///
/// Extra languages are merged into [`DEFAULT_LANGUAGES`]; a missing theme
/// means [`DEFAULT_THEME`].
#[derive(Clone, Debug, Default)]
pub struct HighlightOptions {
    /// Theme name, e.g. `"Solarized (dark)"`.
    pub theme: Option<String>,
    /// Languages to highlight in addition to the defaults.
    pub additional_languages: Vec<String>,
}

/// Effective highlighter configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HighlighterConfig {
    /// Theme name.
    pub theme: String,
    /// Canonical names of highlighted languages.
    pub languages: BTreeSet<String>,
}

impl Default for HighlighterConfig {
    fn default() -> Self {
        Self {
            theme: DEFAULT_THEME.to_owned(),
            languages: DEFAULT_LANGUAGES.iter().map(|&l| l.to_owned()).collect(),
        }
    }
}

impl HighlighterConfig {
    /// Build a configuration from the defaults plus `options`.
    #[must_use]
    pub fn from_options(options: &HighlightOptions) -> Self {
        let mut config = Self::default();
        if let Some(theme) = &options.theme {
            config.theme.clone_from(theme);
        }
        config.languages.extend(
            options
                .additional_languages
                .iter()
                .map(|lang| canonical_language(lang)),
        );
        config
    }
}

/// Normalize a fence language name.
///
/// Lowercases and folds common aliases (`js`, `sh`, `yml`, ...) so the
/// configured language set and code fences agree on one name.
#[must_use]
pub fn canonical_language(lang: &str) -> String {
    let lower = lang.trim().to_ascii_lowercase();
    let canonical = match lower.as_str() {
        "sh" | "shell" | "zsh" => "bash",
        "c++" | "cc" | "hpp" => "cpp",
        "htm" => "html",
        "js" | "mjs" | "cjs" => "javascript",
        "md" => "markdown",
        "py" => "python",
        "rb" => "ruby",
        "rs" => "rust",
        "yml" => "yaml",
        _ => return lower,
    };
    canonical.to_owned()
}

/// Constructed highlighting engine.
pub struct Highlighter {
    syntaxes: SyntaxSet,
    theme: Theme,
    theme_name: String,
    languages: BTreeSet<String>,
}

impl Highlighter {
    /// Load the bundled grammars and the configured theme.
    ///
    /// # Errors
    ///
    /// Returns [`HighlightError::UnknownTheme`] if the theme is not bundled.
    pub fn new(config: &HighlighterConfig) -> Result<Self, HighlightError> {
        let mut themes = ThemeSet::load_defaults();
        let theme = themes
            .themes
            .remove(&config.theme)
            .ok_or_else(|| HighlightError::UnknownTheme(config.theme.clone()))?;

        Ok(Self {
            syntaxes: SyntaxSet::load_defaults_newlines(),
            theme,
            theme_name: config.theme.clone(),
            languages: config.languages.clone(),
        })
    }

    /// Name of the theme in use.
    #[must_use]
    pub fn theme_name(&self) -> &str {
        &self.theme_name
    }

    /// Effective language set.
    #[must_use]
    pub fn languages(&self) -> &BTreeSet<String> {
        &self.languages
    }

    /// Whether code in `lang` is highlighted rather than emitted as plain text.
    #[must_use]
    pub fn supports(&self, lang: &str) -> bool {
        let lang = canonical_language(lang);
        self.languages.contains(&lang) && self.syntaxes.find_syntax_by_token(&lang).is_some()
    }

    /// Render a code block to HTML.
    ///
    /// Languages outside the configured set, or unknown to the grammar bundle,
    /// produce a plain escaped `<pre><code>` block.
    ///
    /// # Errors
    ///
    /// Returns [`HighlightError::Syntect`] if grammar evaluation fails.
    pub fn highlight(&self, code: &str, lang: Option<&str>) -> Result<String, HighlightError> {
        let Some(lang) = lang.map(canonical_language).filter(|l| !l.is_empty()) else {
            return Ok(format!(
                r#"<pre class="tabi-code"><code>{}</code></pre>"#,
                escape(code)
            ));
        };

        let syntax = if self.languages.contains(&lang) {
            self.syntaxes.find_syntax_by_token(&lang)
        } else {
            None
        };
        let Some(syntax) = syntax else {
            return Ok(format!(
                r#"<pre class="tabi-code"><code class="language-{}">{}</code></pre>"#,
                escape(&lang),
                escape(code)
            ));
        };

        let background = self.theme.settings.background;

        let mut out = String::with_capacity(code.len() * 4);
        out.push_str(r#"<pre class="tabi-code""#);
        if let Some(color) = background {
            let _ = write!(out, r#" style="background-color:{};""#, css_color(color));
        }
        let _ = write!(out, r#"><code class="language-{}">"#, escape(&lang));

        let mut lines = HighlightLines::new(syntax, &self.theme);
        for line in LinesWithEndings::from(code) {
            let regions = lines.highlight_line(line, &self.syntaxes)?;
            // Spans matching the block background carry no background style.
            let include_background =
                background.map_or(IncludeBackground::No, IncludeBackground::IfDifferent);
            out.push_str(&styled_line_to_highlighted_html(&regions, include_background)?);
        }

        out.push_str("</code></pre>");
        Ok(out)
    }
}

fn css_color(color: Color) -> String {
    format!("#{:02x}{:02x}{:02x}", color.r, color.g, color.b)
}

#[derive(Default)]
struct ServiceState {
    config: HighlighterConfig,
    instance: Option<Arc<Highlighter>>,
}

/// Lazily constructed, shared [`Highlighter`].
///
/// The first successful [`get`](Self::get) builds the instance from the
/// current configuration; every later call returns the same `Arc`. The state
/// lock is held while building, so concurrent first callers wait for a single
/// construction instead of racing.
///
/// A failed construction leaves no instance behind: configuration remains
/// open and the next `get` tries again.
pub struct HighlighterService {
    state: Mutex<ServiceState>,
}

static GLOBAL: LazyLock<HighlighterService> = LazyLock::new(HighlighterService::new);

impl Default for HighlighterService {
    fn default() -> Self {
        Self::new()
    }
}

impl HighlighterService {
    /// Create a service with the default configuration and no instance.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ServiceState::default()),
        }
    }

    /// Process-wide service.
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    /// Set theme and extra languages.
    ///
    /// Ignored once an instance exists.
    pub async fn configure(&self, options: &HighlightOptions) {
        let mut state = self.state.lock().await;
        if state.instance.is_some() {
            tracing::debug!("Highlighter already constructed, ignoring configuration");
            return;
        }
        state.config = HighlighterConfig::from_options(options);
    }

    /// Get the shared instance, constructing it on first use.
    ///
    /// Construction runs on Tokio's blocking pool when called inside a
    /// runtime, and inline otherwise.
    ///
    /// # Errors
    ///
    /// Returns the construction error; nothing is cached in that case.
    pub async fn get(&self) -> Result<Arc<Highlighter>, HighlightError> {
        let mut state = self.state.lock().await;
        if let Some(instance) = &state.instance {
            return Ok(Arc::clone(instance));
        }

        let config = state.config.clone();
        tracing::debug!(
            theme = %config.theme,
            languages = config.languages.len(),
            "Constructing highlighter"
        );
        // Grammar loading blocks; off-load it when a Tokio runtime is available.
        let highlighter = if tokio::runtime::Handle::try_current().is_ok() {
            tokio::task::spawn_blocking(move || Highlighter::new(&config)).await??
        } else {
            Highlighter::new(&config)?
        };

        let instance = Arc::new(highlighter);
        state.instance = Some(Arc::clone(&instance));
        Ok(instance)
    }

    /// Configuration the next construction would use (or the frozen one).
    pub async fn config(&self) -> HighlighterConfig {
        self.state.lock().await.config.clone()
    }

    /// Whether an instance has been constructed.
    pub async fn is_initialized(&self) -> bool {
        self.state.lock().await.instance.is_some()
    }

    /// Drop the instance and restore the default configuration.
    #[cfg(test)]
    pub async fn reset(&self) {
        *self.state.lock().await = ServiceState::default();
    }
}
