//! `tabi render` command implementation.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Args;
use tabi_config::{CliSettings, Config};
use tabi_renderer::{HighlightOptions, HighlighterService};
use tabi_ssr::{MarkdownConfig, Page, PageRenderer, RenderRequest};

use crate::error::CliError;
use crate::frontmatter::split_frontmatter;
use crate::output::Output;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Markdown file to render.
    input: PathBuf,

    /// Path to configuration file (default: auto-discover tabi.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Route the page is served at (default: derived from the file name).
    #[arg(short, long)]
    route: Option<String>,

    /// Site base path (overrides config).
    #[arg(long)]
    base_path: Option<String>,

    /// Client bundle URL (overrides config).
    #[arg(long)]
    bundle_url: Option<String>,

    /// Highlighting theme (overrides config).
    #[arg(long)]
    theme: Option<String>,

    /// Disable GitHub Flavored Markdown extensions.
    #[arg(long)]
    no_gfm: bool,

    /// Write the document to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration, reading the input, rendering or
    /// writing the output fails.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let cli_settings = CliSettings {
            base_path: self.base_path.clone(),
            bundle_url: self.bundle_url.clone(),
            theme: self.theme.clone(),
            gfm: self.no_gfm.then_some(false),
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let html = self.render(&config, HighlighterService::global()).await?;

        match &self.output {
            Some(path) => {
                std::fs::write(path, &html)?;
                Output::new().success(&format!("Wrote {}", path.display()));
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(html.as_bytes())?;
                stdout.flush()?;
            }
        }
        Ok(())
    }

    /// Render the input file to a document with `config` applied.
    async fn render(
        &self,
        config: &Config,
        highlighter: &HighlighterService,
    ) -> Result<String, CliError> {
        let route = match &self.route {
            Some(route) if !route.starts_with('/') => {
                return Err(CliError::Validation(format!(
                    "route must start with '/': {route}"
                )));
            }
            Some(route) => route.clone(),
            None => route_from_path(&self.input),
        };

        let source = std::fs::read_to_string(&self.input)?;
        let (frontmatter, body) = split_frontmatter(&source)?;
        let page = Page::markdown(frontmatter, body, &self.input);

        highlighter
            .configure(&HighlightOptions {
                theme: config.highlight.theme.clone(),
                additional_languages: config.highlight.languages.clone(),
            })
            .await;

        tracing::info!(
            input = %self.input.display(),
            route = %route,
            "Rendering page"
        );

        let html = PageRenderer::new(highlighter)
            .with_base_path(&config.site.base_path)
            .with_markdown_config(MarkdownConfig {
                class_name: config.markdown.class_name.clone(),
                gfm: config.markdown.gfm,
            })
            .render(&RenderRequest {
                page: &page,
                layouts: &[],
                route: &route,
                bundle_url: &config.site.bundle_url,
            })
            .await?;

        Ok(html)
    }
}

/// Route for a source file: `/` for `index.md`, `/<stem>` otherwise.
fn route_from_path(path: &Path) -> String {
    match path.file_stem().and_then(|s| s.to_str()) {
        Some("index") | None => "/".to_owned(),
        Some(stem) => format!("/{stem}"),
    }
}
