//! Configuration parsing and management.

use crate::language::LanguageSpec;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Entries copied or served verbatim when they appear at the content root.
pub const DEFAULT_PASSTHROUGH: &[&str] = &[
    "ads.txt",
    "app-ads.txt",
    "assets",
    "files",
    "images",
    "sites",
    "static",
];

/// What to do with a page directory that holds no translatable fragment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyPagePolicy {
    /// Leave the page out of the model and record it as skipped.
    #[default]
    Skip,
    /// Abort the build.
    Error,
}

/// Main configuration struct matching the polysite.yml schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub paths: PathsConfig,

    #[serde(default = "default_languages")]
    pub languages: Vec<LanguageSpec>,

    #[serde(default = "default_passthrough")]
    pub passthrough: Vec<String>,

    #[serde(default)]
    pub templates: TemplatesConfig,

    #[serde(default)]
    pub empty_pages: EmptyPagePolicy,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub server: ServerConfig,

    // Internal: path to config file (for relative path resolution)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

fn default_languages() -> Vec<LanguageSpec> {
    vec![LanguageSpec::from("de"), LanguageSpec::from("en")]
}

fn default_passthrough() -> Vec<String> {
    DEFAULT_PASSTHROUGH.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub content: PathBuf,
    pub output: PathBuf,

    /// Application-supplied template fragments added to the base set
    #[serde(default)]
    pub extra_templates: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplatesConfig {
    /// Skeleton template every page extends
    #[serde(default = "default_entry")]
    pub entry: String,

    /// Extensions recognized as template sources (without the dot)
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_entry() -> String {
    String::from("layout.html")
}

fn default_extensions() -> Vec<String> {
    vec![String::from("html")]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Static exports must land strictly below this directory
    #[serde(default = "default_safe_root")]
    pub safe_root: PathBuf,
}

fn default_safe_root() -> PathBuf {
    PathBuf::from("/tmp")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_interface")]
    pub interface: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_interface() -> String {
    String::from("127.0.0.1")
}

fn default_port() -> u16 {
    8000
}

impl Config {
    /// Build a config in memory, with every optional section at its default.
    pub fn new(content: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            paths: PathsConfig {
                content: content.into(),
                output: output.into(),
                extra_templates: None,
            },
            languages: default_languages(),
            passthrough: default_passthrough(),
            templates: TemplatesConfig::default(),
            empty_pages: EmptyPagePolicy::default(),
            export: ExportConfig::default(),
            server: ServerConfig::default(),
            config_path: None,
        }
    }

    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&contents)?;

        // Store config file path for relative path resolution
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.languages.is_empty() {
            return Err(ConfigError::Invalid {
                field: "languages",
                reason: "at least one language is required".into(),
            });
        }
        if self.templates.entry.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "templates.entry",
                reason: "must name a skeleton template".into(),
            });
        }
        if self.templates.extensions.iter().any(|ext| ext == "md") {
            return Err(ConfigError::Invalid {
                field: "templates.extensions",
                reason: "\"md\" is reserved for markdown fragments".into(),
            });
        }
        if self.server.interface.parse::<std::net::IpAddr>().is_err() {
            return Err(ConfigError::Invalid {
                field: "server.interface",
                reason: format!("{:?} is not an IP address", self.server.interface),
            });
        }
        Ok(())
    }

    /// Get the content directory, resolved relative to config file
    pub fn content_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.content)
    }

    /// Get the output directory, resolved relative to config file
    pub fn output_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.output)
    }

    /// Get the extra templates directory, if any
    pub fn extra_templates_dir(&self) -> Option<PathBuf> {
        self.paths
            .extra_templates
            .as_ref()
            .map(|p| self.resolve_path(p))
    }

    /// Get the directory static exports are confined to
    pub fn safe_root(&self) -> PathBuf {
        self.resolve_path(&self.export.safe_root)
    }

    /// Resolve a path relative to the config file location
    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(config_path) = &self.config_path {
            if let Some(parent) = config_path.parent() {
                parent.join(path)
            } else {
                path.to_path_buf()
            }
        } else {
            path.to_path_buf()
        }
    }
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            entry: default_entry(),
            extensions: default_extensions(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            safe_root: default_safe_root(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            interface: default_interface(),
            port: default_port(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::from_yaml(
            r#"
paths:
  content: site
  output: /tmp/build/site
"#,
        )
        .unwrap();

        assert_eq!(config.languages.len(), 2);
        assert_eq!(config.passthrough.len(), DEFAULT_PASSTHROUGH.len());
        assert_eq!(config.templates.entry, "layout.html");
        assert_eq!(config.templates.extensions, vec!["html".to_string()]);
        assert_eq!(config.empty_pages, EmptyPagePolicy::Skip);
        assert_eq!(config.export.safe_root, PathBuf::from("/tmp"));
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_language_forms() {
        let config = Config::from_yaml(
            r#"
paths:
  content: site
  output: out
languages:
  - de
  - tag: en-US
    prefix: en
    name: English
empty_pages: error
"#,
        )
        .unwrap();

        assert_eq!(config.languages[0], LanguageSpec::from("de"));
        assert_eq!(config.languages[1].tag(), "en-US");
        assert_eq!(config.empty_pages, EmptyPagePolicy::Error);
    }

    #[test]
    fn test_rejects_empty_language_list() {
        let err = Config::from_yaml(
            r#"
paths:
  content: site
  output: out
languages: []
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "languages", .. }));
    }

    #[test]
    fn test_rejects_markdown_as_template_extension() {
        let err = Config::from_yaml(
            r#"
paths:
  content: site
  output: out
templates:
  extensions: [html, md]
"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "templates.extensions",
                ..
            }
        ));
    }

    #[test]
    fn test_relative_paths_follow_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("polysite.yml");
        std::fs::write(
            &path,
            "paths:\n  content: site\n  output: /tmp/out\n  extra_templates: widgets\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.content_dir(), dir.path().join("site"));
        assert_eq!(config.output_dir(), PathBuf::from("/tmp/out"));
        assert_eq!(config.extra_templates_dir(), Some(dir.path().join("widgets")));
    }
}
