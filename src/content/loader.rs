//! Content loader - ingests the source directory into a content graph

use anyhow::{Context, Result};
use glob::Pattern;
use std::fs;
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

use super::discovery::{self, DiscoveryOptions};
use super::file_path::to_slash;
use super::{ContentNode, FileNode, FrontMatter, MdxNode};
use crate::graph::ContentGraph;
use crate::Site;

/// Loads content from the source directory
pub struct ContentLoader<'a> {
    site: &'a Site,
    ignore: Vec<Pattern>,
    options: DiscoveryOptions,
}

impl<'a> ContentLoader<'a> {
    /// Create a new content loader
    pub fn new(site: &'a Site) -> Result<Self> {
        let ignore = site
            .config
            .ignore
            .iter()
            .map(|p| Pattern::new(p).with_context(|| format!("Invalid ignore pattern {:?}", p)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            site,
            ignore,
            options: DiscoveryOptions::from_config(&site.config),
        })
    }

    /// Walk the source directory and build the content graph.
    ///
    /// Every file becomes a `File` node; documents also get an `Mdx` child.
    /// Discovery runs once for each node as it is created.
    pub fn load(&self) -> Result<ContentGraph> {
        let mut graph = ContentGraph::new();
        let source_dir = &self.site.source_dir;

        if !source_dir.exists() {
            tracing::warn!("Source directory {:?} does not exist", source_dir);
            return Ok(graph);
        }

        let walker = WalkDir::new(source_dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !self.is_skipped(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative = to_slash(path.strip_prefix(source_dir).unwrap_or(path));
            if self.ignore.iter().any(|p| p.matches(&relative)) {
                tracing::debug!("Ignored: {}", relative);
                continue;
            }

            self.ingest(&mut graph, path, relative)?;
        }

        tracing::info!(
            "Ingested {} nodes ({} documents)",
            graph.len(),
            graph.nodes_of_type(super::MDX_TYPE).count()
        );

        Ok(graph)
    }

    /// Create the nodes for one file
    fn ingest(&self, graph: &mut ContentGraph, path: &Path, relative: String) -> Result<()> {
        let file = FileNode::new(path.to_path_buf(), relative);

        let document = if self.site.config.is_document_extension(&file.extension) {
            let content =
                fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
            Some(match FrontMatter::parse(&content) {
                Ok((fm, body)) => (MdxNode::new(&file, fm, body.to_string()), None),
                Err(e) => (
                    MdxNode::new(&file, FrontMatter::default(), content.clone()),
                    Some(e.to_string()),
                ),
            })
        } else {
            None
        };

        graph.create_node(ContentNode::File(file), |node, actions| {
            discovery::on_create_node(node, actions, &self.options)
        });

        if let Some((mdx, error)) = document {
            let id = mdx.id.clone();
            graph.create_node(ContentNode::Mdx(mdx), |node, actions| {
                discovery::on_create_node(node, actions, &self.options)
            });
            if let Some(error) = error {
                tracing::warn!("{}: {}", id, error);
                graph.record_node_error(&id, error);
            }
        }

        Ok(())
    }

    /// Hidden entries, dependency folders and the output directory are never content
    fn is_skipped(&self, entry: &DirEntry) -> bool {
        let name = entry.file_name().to_string_lossy();
        name.starts_with('.') || name == "node_modules" || entry.path() == self.site.public_dir
    }
}
