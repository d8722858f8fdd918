//! Configuration management for mdtree.
//!
//! Parses `mdtree.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! ```toml
//! [options]
//! smart = true
//! source_pos = false
//!
//! [render]
//! width = 100
//! ```

use std::path::{Path, PathBuf};

use mdtree::{Document, NodeRef, RenderError, RenderFormat, RenderOptions};
use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "mdtree.toml";

/// Largest accepted wrap width.
const MAX_WIDTH: usize = 1000;

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Parse and render flags.
    pub options: RenderOptions,
    /// Renderer settings.
    pub render: RenderConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Renderer settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Wrap width for CommonMark and LaTeX output; `0` disables wrapping.
    pub width: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: mdtree::DEFAULT_WIDTH,
        }
    }
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
}

impl Config {
    /// Load configuration from file.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `mdtree.toml` in current directory and parents,
    /// falling back to defaults when none exists.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails or
    /// a value is out of range.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            return Self::load_from_file(path);
        }

        let discovered = std::env::current_dir()
            .ok()
            .and_then(|cwd| discover_config(&cwd));
        match discovered {
            Some(path) => Self::load_from_file(&path),
            None => {
                tracing::debug!("No {CONFIG_FILENAME} found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.config_path = Some(path.to_path_buf());
        config.validate()?;

        tracing::debug!(
            path = %path.display(),
            width = config.render.width,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if `render.width` exceeds the limit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.render.width > MAX_WIDTH {
            return Err(ConfigError::Validation(format!(
                "render.width cannot exceed {MAX_WIDTH}"
            )));
        }
        Ok(())
    }

    /// Parse markdown with the configured options.
    #[must_use]
    pub fn parse(&self, text: &str) -> Document {
        Document::parse(text, &self.options)
    }

    /// Render a subtree with the configured options and width.
    ///
    /// # Errors
    ///
    /// Returns the renderer's error if output cannot be written.
    pub fn render(&self, node: NodeRef<'_>, format: RenderFormat) -> Result<String, RenderError> {
        mdtree::render_with_width(node, format, &self.options, self.render.width)
    }
}

/// Search for config file in `start` and its parents.
fn discover_config(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
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

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.options, RenderOptions::default());
        assert_eq!(config.render.width, 80);
        assert!(config.config_path.is_none());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.options, RenderOptions::default());
        assert_eq!(config.render.width, 80);
    }

    #[test]
    fn test_parse_options() {
        let toml = r"
[options]
source_pos = true
unsafe = true
smart = true

[render]
width = 72
";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.options,
            RenderOptions::new().with_source_pos().with_unsafe().with_smart()
        );
        assert_eq!(config.render.width, 72);
    }

    #[test]
    fn test_parse_rejects_wrong_type() {
        let result: Result<Config, _> = toml::from_str("[options]\nsmart = \"yes\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_explicit_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("custom.toml");
        fs::write(&path, "[options]\nhard_breaks = true\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert!(config.options.hard_breaks);
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("missing.toml");

        let result = Config::load(Some(&path));
        assert!(matches!(result, Err(ConfigError::NotFound(p)) if p == path));
    }

    #[test]
    fn test_load_invalid_toml() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join(CONFIG_FILENAME);
        fs::write(&path, "[options\n").unwrap();

        assert!(matches!(Config::load(Some(&path)), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validate_width_too_large() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join(CONFIG_FILENAME);
        fs::write(&path, "[render]\nwidth = 5000\n").unwrap();

        let err = Config::load(Some(&path)).unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: render.width cannot exceed 1000");
    }

    #[test]
    fn test_validate_default_config_passes() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_discover_config_in_parent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        let path = temp_dir.path().join(CONFIG_FILENAME);
        fs::write(&path, "").unwrap();

        assert_eq!(discover_config(&nested), Some(path));
    }

    #[test]
    fn test_discover_prefers_nearest() {
        let temp_dir = tempfile::tempdir().unwrap();
        let nested = temp_dir.path().join("sub");
        fs::create_dir_all(&nested).unwrap();
        fs::write(temp_dir.path().join(CONFIG_FILENAME), "").unwrap();
        fs::write(nested.join(CONFIG_FILENAME), "").unwrap();

        assert_eq!(discover_config(&nested), Some(nested.join(CONFIG_FILENAME)));
    }

    #[test]
    fn test_render_uses_configured_width() {
        let config: Config = toml::from_str("[render]\nwidth = 8\n").unwrap();
        let doc = config.parse("aaa bbb ccc\n");
        let out = config.render(doc.root(), RenderFormat::CommonMark).unwrap();
        assert_eq!(out, "aaa bbb\nccc\n");
    }

    #[test]
    fn test_parse_uses_configured_options() {
        let config: Config = toml::from_str("[options]\nsmart = true\nnormalize = true\n").unwrap();
        let doc = config.parse("a -- b\n");
        let text = doc.root().first_child().unwrap().first_child().unwrap();
        assert_eq!(text.literal(), Some("a \u{2013} b"));
    }
}
