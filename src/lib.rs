//! sitegraph: a static site generator built around a content graph
//!
//! Source files are ingested into a graph of nodes. Documents get a `slug`
//! and a `relativePath` while they are ingested, then one page is created per
//! document by querying the graph, and every page is rendered through the
//! blog post template.

pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod generator;
pub mod graph;
pub mod helpers;
pub mod pages;
pub mod server;
pub mod templates;

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Name of the configuration file at the site root
pub const CONFIG_FILE: &str = "_config.yml";

/// A site on disk
#[derive(Debug, Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Source directory, the root of ingestion
    pub source_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
}

impl Site {
    /// Open the site rooted at a directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        let base_dir = if base_dir.is_absolute() {
            base_dir.to_path_buf()
        } else {
            std::env::current_dir()?.join(base_dir)
        };

        let config_path = base_dir.join(CONFIG_FILE);
        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        Ok(Self::with_config(base_dir, config))
    }

    /// Build a site from an already loaded configuration
    pub fn with_config(base_dir: PathBuf, config: config::SiteConfig) -> Self {
        let source_dir = base_dir.join(&config.source_dir);
        let public_dir = base_dir.join(&config.public_dir);

        Self {
            config,
            base_dir,
            source_dir,
            public_dir,
        }
    }

    /// Build the site
    pub fn build(&self) -> Result<commands::build::BuildSummary> {
        commands::build::run(self)
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }

    /// Create a new document
    pub fn new_document(&self, title: &str, dir: Option<&str>) -> Result<PathBuf> {
        commands::new::create_document(self, title, dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_paths_follow_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "source_dir: site\npublic_dir: dist\n",
        )
        .unwrap();

        let site = Site::new(dir.path()).unwrap();
        assert_eq!(site.source_dir, dir.path().join("site"));
        assert_eq!(site.public_dir, dir.path().join("dist"));
    }

    #[test]
    fn test_site_defaults_without_config() {
        let dir = tempfile::tempdir().unwrap();
        let site = Site::new(dir.path()).unwrap();
        assert_eq!(site.source_dir, dir.path().join("src"));
        assert_eq!(site.config.base_path, "content");
    }
}
