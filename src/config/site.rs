//! Site configuration (_config.yml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub author: String,

    // URL
    pub url: String,
    pub root: String,

    // Directory
    pub source_dir: String,
    pub public_dir: String,

    // Routing
    /// Directory (relative to the source dir) removed from the front of slugs
    pub base_path: String,
    /// `relativePath` starts at the first occurrence of this marker
    pub relative_path_marker: String,
    pub trailing_slash: bool,
    /// File extensions ingested as documents
    pub extensions: Vec<String>,
    /// Glob patterns, relative to the source dir, that are never ingested
    #[serde(default)]
    pub ignore: Vec<String>,
    pub duplicate_slugs: DuplicateSlugPolicy,

    // Writing
    #[serde(default)]
    pub highlight: HighlightConfig,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Site".to_string(),
            description: String::new(),
            author: String::new(),

            url: "http://example.com".to_string(),
            root: "/".to_string(),

            source_dir: "src".to_string(),
            public_dir: "public".to_string(),

            base_path: "content".to_string(),
            relative_path_marker: "src/".to_string(),
            trailing_slash: true,
            extensions: vec!["md".to_string(), "mdx".to_string()],
            ignore: Vec::new(),
            duplicate_slugs: DuplicateSlugPolicy::default(),

            highlight: HighlightConfig::default(),
            extra: HashMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {:?}", path))?;
        let config: SiteConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config {:?}", path))?;
        Ok(config)
    }

    /// Whether a file extension marks a document
    pub fn is_document_extension(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }
}

/// What happens when two pages resolve to the same path
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateSlugPolicy {
    /// Last registration wins and a warning is reported
    #[default]
    Warn,
    /// Registration fails and the build aborts
    Error,
    /// Last registration wins silently
    Overwrite,
}

/// Code block highlighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub theme: String,
    pub line_number: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            theme: "base16-ocean.dark".to_string(),
            line_number: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.source_dir, "src");
        assert_eq!(config.base_path, "content");
        assert_eq!(config.relative_path_marker, "src/");
        assert_eq!(config.duplicate_slugs, DuplicateSlugPolicy::Warn);
        assert!(config.trailing_slash);
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: Token Docs
base_path: articles
duplicate_slugs: error
extensions: [mdx]
ignore:
  - "**/drafts/**"
highlight:
  line_number: false
analytics_id: UA-1
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "Token Docs");
        assert_eq!(config.base_path, "articles");
        assert_eq!(config.duplicate_slugs, DuplicateSlugPolicy::Error);
        assert_eq!(config.ignore, vec!["**/drafts/**"]);
        assert!(!config.highlight.line_number);
        assert_eq!(config.highlight.theme, "base16-ocean.dark");
        assert!(config.is_document_extension("MDX"));
        assert!(!config.is_document_extension("md"));
        assert!(config.extra.contains_key("analytics_id"));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(SiteConfig::load(dir.path().join("_config.yml")).is_err());
    }
}
