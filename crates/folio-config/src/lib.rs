//! Configuration management for folio.
//!
//! Parses `folio.toml` with serde and discovers it in the current directory
//! or its parents. CLI settings are applied during load via [`CliSettings`].
//!
//! ```toml
//! [render]
//! max_nesting_depth = 200
//! extensions = ["front-matter", "footnote", "typographic"]
//!
//! [emoji]
//! mode = "image"
//! image_root = "${ASSETS_URL:-/static}/emoji/"
//! ```
//!
//! ## Environment Variable Expansion
//!
//! `emoji.image_root` and `issues.root` support `${VAR}` (error if unset)
//! and `${VAR:-default}`.

mod expand;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use folio_renderer::ext::{
    AnchorOptions, EmojiOptions, IssueOptions, STANDARD_EXTENSIONS, StandardOptions,
};
use folio_renderer::{DEFAULT_MAX_NESTING_DEPTH, PipelineOptions};
use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "folio.toml";

/// Largest accepted `render.max_nesting_depth`.
const MAX_NESTING_DEPTH_LIMIT: usize = 100_000;

/// CLI settings that override configuration file values.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the nesting depth limit.
    pub max_nesting_depth: Option<usize>,
    /// Override front matter extraction.
    pub front_matter: Option<bool>,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub render: RenderConfig,
    pub emoji: EmojiOptions,
    pub issues: IssueOptions,
    pub anchor_links: AnchorOptions,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Parser and renderer settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub max_nesting_depth: usize,
    /// Ordered subset of built-in extensions; `None` enables all of them.
    pub extensions: Option<Vec<String>>,
    pub front_matter: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            extensions: None,
            front_matter: true,
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
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`emoji.image_root`").
        field: String,
        /// Error message (e.g., "${`ASSETS_URL`} not set").
        message: String,
    },
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise searches
    /// for `folio.toml` in the current directory and its parents, falling
    /// back to defaults.
    ///
    /// # Errors
    ///
    /// Returns error if an explicit `config_path` doesn't exist, parsing or
    /// expansion fails, or the resulting configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else {
            let cwd = std::env::current_dir()?;
            match Self::discover_from(&cwd) {
                Some(discovered) => Self::load_from_file(&discovered)?,
                None => Self::default(),
            }
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }
        config.validate()?;

        Ok(config)
    }

    /// Search for the config file in `start` and its ancestors.
    fn discover_from(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILENAME))
            .find(|candidate| candidate.is_file())
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.expand_env_vars()?;
        config.config_path = Some(path.to_path_buf());
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(depth) = settings.max_nesting_depth {
            self.render.max_nesting_depth = depth;
        }
        if let Some(front_matter) = settings.front_matter {
            self.render.front_matter = front_matter;
        }
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.emoji.image_root = expand::expand_env(&self.emoji.image_root, "emoji.image_root")?;
        self.issues.root = expand::expand_env(&self.issues.root, "issues.root")?;
        Ok(())
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_depth()?;
        self.validate_extensions()?;
        Ok(())
    }

    fn validate_depth(&self) -> Result<(), ConfigError> {
        let depth = self.render.max_nesting_depth;
        if depth == 0 {
            return Err(ConfigError::Validation(
                "render.max_nesting_depth must be greater than 0".to_owned(),
            ));
        }
        if depth > MAX_NESTING_DEPTH_LIMIT {
            return Err(ConfigError::Validation(format!(
                "render.max_nesting_depth cannot exceed {MAX_NESTING_DEPTH_LIMIT}"
            )));
        }
        Ok(())
    }

    fn validate_extensions(&self) -> Result<(), ConfigError> {
        let Some(names) = &self.render.extensions else {
            return Ok(());
        };
        let mut seen = HashSet::new();
        for name in names {
            if name != "core" && !STANDARD_EXTENSIONS.contains(&name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "render.extensions: unknown extension '{name}'"
                )));
            }
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "render.extensions: '{name}' is listed more than once"
                )));
            }
        }
        Ok(())
    }

    /// Options for the configurable built-in extensions.
    #[must_use]
    pub fn standard_options(&self) -> StandardOptions {
        StandardOptions {
            emoji: self.emoji.clone(),
            issues: self.issues.clone(),
            anchor_links: self.anchor_links.clone(),
        }
    }

    #[must_use]
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions::default()
            .with_max_nesting_depth(self.render.max_nesting_depth)
            .with_front_matter(self.render.front_matter)
    }

    /// Selected extension names, if the config narrows the standard set.
    #[must_use]
    pub fn extensions(&self) -> Option<&[String]> {
        self.render.extensions.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use folio_renderer::ext::EmojiMode;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.render.max_nesting_depth, 1000);
        assert!(config.render.front_matter);
        assert!(config.extensions().is_none());
        assert_eq!(config.emoji.mode, EmojiMode::Unicode);
        assert_eq!(config.emoji.image_root, "/img/");
        assert_eq!(config.issues.class, "gfm-issue");
        assert_eq!(config.anchor_links.class, "anchor");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.render.max_nesting_depth, 1000);
        assert_eq!(config.standard_options(), StandardOptions::default());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r##"
[render]
max_nesting_depth = 64
extensions = ["footnote", "emoji"]
front_matter = false

[emoji]
mode = "image"
image_root = "/static/emoji/"
image_size = 16

[issues]
root = "https://tracker.example.com/"
class = "issue"

[anchor_links]
class = "permalink"
text = "#"
"##;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.render.max_nesting_depth, 64);
        assert_eq!(
            config.extensions(),
            Some(["footnote".to_owned(), "emoji".to_owned()].as_slice())
        );
        assert!(!config.render.front_matter);
        assert_eq!(config.emoji.mode, EmojiMode::Image);
        assert_eq!(config.emoji.image_root, "/static/emoji/");
        assert_eq!(config.emoji.image_size, 16);
        assert_eq!(config.issues.root, "https://tracker.example.com/");
        assert_eq!(config.issues.class, "issue");
        assert_eq!(config.anchor_links.text, "#");

        let options = config.pipeline_options();
        assert_eq!(options.max_nesting_depth, 64);
        assert!(!options.front_matter);
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config: Config = toml::from_str("[emoji]\nimage_size = 32\n").unwrap();
        assert_eq!(config.emoji.image_size, 32);
        assert_eq!(config.emoji.image_root, "/img/");
        assert_eq!(config.emoji.mode, EmojiMode::Unicode);
    }

    #[test]
    fn test_invalid_emoji_mode_is_parse_error() {
        let result: Result<Config, _> = toml::from_str("[emoji]\nmode = \"sprite\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default();
        config.apply_cli_settings(&CliSettings {
            max_nesting_depth: Some(10),
            ..Default::default()
        });
        assert_eq!(config.render.max_nesting_depth, 10);
        assert!(config.render.front_matter);

        config.apply_cli_settings(&CliSettings {
            front_matter: Some(false),
            ..Default::default()
        });
        assert_eq!(config.render.max_nesting_depth, 10);
        assert!(!config.render.front_matter);
    }

    /// Assert that validation fails with expected substrings in the error message.
    fn assert_validation_error(config: &Config, expected_substrings: &[&str]) {
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation(_)),
            "Expected ConfigError::Validation, got {err:?}"
        );
        let msg = err.to_string();
        for s in expected_substrings {
            assert!(
                msg.contains(s),
                "Expected error to contain '{s}', got: {msg}"
            );
        }
    }

    #[test]
    fn test_validate_depth_zero() {
        let mut config = Config::default();
        config.render.max_nesting_depth = 0;
        assert_validation_error(&config, &["max_nesting_depth", "greater than 0"]);
    }

    #[test]
    fn test_validate_depth_too_high() {
        let mut config = Config::default();
        config.render.max_nesting_depth = 1_000_000;
        assert_validation_error(&config, &["max_nesting_depth", "100000"]);
    }

    #[test]
    fn test_validate_unknown_extension() {
        let mut config = Config::default();
        config.render.extensions = Some(vec!["emoji".to_owned(), "xwiki".to_owned()]);
        assert_validation_error(&config, &["unknown", "xwiki"]);
    }

    #[test]
    fn test_validate_duplicate_extension() {
        let mut config = Config::default();
        config.render.extensions = Some(vec!["emoji".to_owned(), "emoji".to_owned()]);
        assert_validation_error(&config, &["emoji", "more than once"]);
    }

    #[test]
    fn test_validate_core_is_accepted() {
        let mut config = Config::default();
        config.render.extensions = Some(vec!["core".to_owned(), "footnote".to_owned()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("FOLIO_TEST_TRACKER", "https://tracker.test");
            std::env::remove_var("FOLIO_TEST_NO_CDN");
        }
        let toml = r#"
[emoji]
image_root = "${FOLIO_TEST_NO_CDN:-/img}/emoji/"

[issues]
root = "${FOLIO_TEST_TRACKER}/issues/"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.expand_env_vars().unwrap();
        assert_eq!(config.emoji.image_root, "/img/emoji/");
        assert_eq!(config.issues.root, "https://tracker.test/issues/");
        unsafe {
            std::env::remove_var("FOLIO_TEST_TRACKER");
        }
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "[render]\nmax_nesting_depth = 12\n").unwrap();

        let config = Config::load(Some(&path), None).unwrap();
        assert_eq!(config.render.max_nesting_depth, 12);
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(&path, "[render\n").unwrap();
        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_cli_settings_are_validated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(&path, "").unwrap();
        let settings = CliSettings {
            max_nesting_depth: Some(0),
            ..Default::default()
        };
        let err = Config::load(Some(&path), Some(&settings)).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_discover_walks_ancestors() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("docs").join("guide");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), "").unwrap();

        assert_eq!(
            Config::discover_from(&nested),
            Some(dir.path().join(CONFIG_FILENAME))
        );
    }

    #[test]
    fn test_discover_prefers_nearest() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("docs");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), "").unwrap();
        fs::write(nested.join(CONFIG_FILENAME), "").unwrap();

        assert_eq!(
            Config::discover_from(&nested),
            Some(nested.join(CONFIG_FILENAME))
        );
    }

    #[test]
    fn test_discover_ignores_directories_named_like_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(CONFIG_FILENAME)).unwrap();
        let found = Config::discover_from(dir.path());
        assert_ne!(found, Some(dir.path().join(CONFIG_FILENAME)));
    }
}
