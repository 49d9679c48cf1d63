//! Configuration management for Tabi.
//!
//! Parses `tabi.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `site.base_path`
//! - `site.bundle_url`
//! - `markdown.class_name`
//! - `highlight.theme`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override site base path.
    pub base_path: Option<String>,
    /// Override client bundle URL.
    pub bundle_url: Option<String>,
    /// Override highlighting theme.
    pub theme: Option<String>,
    /// Override GFM flag.
    pub gfm: Option<bool>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "tabi.toml";

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Site-wide settings.
    pub site: SiteConfig,
    /// Markdown presentation settings.
    pub markdown: MarkdownSettings,
    /// Syntax highlighting settings.
    pub highlight: HighlightSettings,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Site configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// URL prefix the site is served under.
    pub base_path: String,
    /// Public URL of the client bundle.
    pub bundle_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_path: "/".to_owned(),
            bundle_url: "/assets/client.js".to_owned(),
        }
    }
}

/// Markdown configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MarkdownSettings {
    /// Class added to markdown container elements.
    pub class_name: Option<String>,
    /// Enable GitHub Flavored Markdown extensions.
    pub gfm: bool,
}

impl Default for MarkdownSettings {
    fn default() -> Self {
        Self {
            class_name: None,
            gfm: true,
        }
    }
}

/// Highlighting configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HighlightSettings {
    /// Theme name. `None` uses the highlighter's default theme.
    pub theme: Option<String>,
    /// Languages added to the default set.
    pub languages: Vec<String>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`site.base_path`").
        field: String,
        /// Error message (e.g., "${`TABI_BASE`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `tabi.toml` in current directory and parents,
    /// falling back to defaults.
    ///
    /// CLI settings are applied after loading, allowing CLI arguments to take
    /// precedence over config file values. The result is validated again
    /// after overrides.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails or
    /// the final values are invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(base_path) = &settings.base_path {
            self.site.base_path.clone_from(base_path);
        }
        if let Some(bundle_url) = &settings.bundle_url {
            self.site.bundle_url.clone_from(bundle_url);
        }
        if let Some(theme) = &settings.theme {
            self.highlight.theme = Some(theme.clone());
        }
        if let Some(gfm) = settings.gfm {
            self.markdown.gfm = gfm;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;
        config.config_path = Some(path.to_path_buf());
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_site()?;
        self.validate_markdown()?;
        self.validate_highlight()?;
        Ok(())
    }

    fn validate_site(&self) -> Result<(), ConfigError> {
        if !self.site.base_path.starts_with('/') {
            return Err(ConfigError::Validation(
                "site.base_path must start with '/'".to_owned(),
            ));
        }
        require_non_empty(&self.site.bundle_url, "site.bundle_url")
    }

    fn validate_markdown(&self) -> Result<(), ConfigError> {
        if let Some(class_name) = &self.markdown.class_name {
            require_non_empty(class_name, "markdown.class_name")?;
            if class_name.contains('"') {
                return Err(ConfigError::Validation(
                    "markdown.class_name cannot contain '\"'".to_owned(),
                ));
            }
        }
        Ok(())
    }

    fn validate_highlight(&self) -> Result<(), ConfigError> {
        if let Some(theme) = &self.highlight.theme {
            require_non_empty(theme, "highlight.theme")?;
        }
        for language in &self.highlight.languages {
            require_non_empty(language.trim(), "highlight.languages entry")?;
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.site.base_path = expand::expand_env(&self.site.base_path, "site.base_path")?;
        self.site.bundle_url = expand::expand_env(&self.site.bundle_url, "site.bundle_url")?;
        expand::expand_opt(&mut self.markdown.class_name, "markdown.class_name")?;
        expand::expand_opt(&mut self.highlight.theme, "highlight.theme")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.site.base_path, "/");
        assert_eq!(config.site.bundle_url, "/assets/client.js");
        assert!(config.markdown.gfm);
        assert_eq!(config.markdown.class_name, None);
        assert_eq!(config.highlight.theme, None);
        assert!(config.highlight.languages.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.site.base_path, "/");
        assert!(config.markdown.gfm);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[site]
base_path = "/docs/"
bundle_url = "/docs/assets/app.js"

[markdown]
class_name = "prose"
gfm = false

[highlight]
theme = "Solarized (dark)"
languages = ["zig", "haskell"]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.site.base_path, "/docs/");
        assert_eq!(config.site.bundle_url, "/docs/assets/app.js");
        assert_eq!(config.markdown.class_name.as_deref(), Some("prose"));
        assert!(!config.markdown.gfm);
        assert_eq!(config.highlight.theme.as_deref(), Some("Solarized (dark)"));
        assert_eq!(
            config.highlight.languages,
            vec!["zig".to_owned(), "haskell".to_owned()]
        );
    }

    #[test]
    fn test_base_path_must_be_absolute() {
        let config: Config = toml::from_str("[site]\nbase_path = \"docs\"\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation(_)),
            "Expected ConfigError::Validation, got {err:?}"
        );
        assert!(err.to_string().contains("site.base_path"));
    }

    #[test]
    fn test_empty_language_rejected() {
        let config: Config = toml::from_str("[highlight]\nlanguages = [\"rust\", \" \"]\n").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_class_name_with_quote_rejected() {
        let config: Config =
            toml::from_str("[markdown]\nclass_name = 'a\" onload=\"x'\n").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default();
        let overrides = CliSettings {
            base_path: Some("/preview/".to_owned()),
            gfm: Some(false),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(config.site.base_path, "/preview/");
        assert!(!config.markdown.gfm);
        assert_eq!(config.site.bundle_url, "/assets/client.js"); // Unchanged
        assert_eq!(config.highlight.theme, None); // Unchanged
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tabi.toml");
        fs::write(
            &path,
            "[site]\nbase_path = \"/guide/\"\n\n[highlight]\nlanguages = [\"zig\"]\n",
        )
        .unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.site.base_path, "/guide/");
        assert_eq!(config.highlight.languages, vec!["zig".to_owned()]);
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        assert!(matches!(
            Config::load(Some(&path), None),
            Err(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tabi.toml");
        fs::write(&path, "[site\nbase_path = ").unwrap();
        assert!(matches!(
            Config::load(Some(&path), None),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_expands_env_vars() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::set_var("TABI_TEST_LOAD_CLASS", "markdown-body");
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tabi.toml");
        fs::write(
            &path,
            "[markdown]\nclass_name = \"${TABI_TEST_LOAD_CLASS}\"\n\n[highlight]\ntheme = \"${TABI_TEST_LOAD_THEME_UNSET:-base16-ocean.dark}\"\n",
        )
        .unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.markdown.class_name.as_deref(), Some("markdown-body"));
        assert_eq!(config.highlight.theme.as_deref(), Some("base16-ocean.dark"));
        unsafe {
            std::env::remove_var("TABI_TEST_LOAD_CLASS");
        }
    }

    #[test]
    fn test_cli_override_is_validated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tabi.toml");
        fs::write(&path, "").unwrap();
        let overrides = CliSettings {
            base_path: Some("relative".to_owned()),
            ..Default::default()
        };

        assert!(matches!(
            Config::load(Some(&path), Some(&overrides)),
            Err(ConfigError::Validation(_))
        ));
    }
}
