//! Content discovery - derives routing fields for documents as they are created

use super::file_path::{derive_slug, relative_path_from_marker};
use super::{ContentNode, MdxNode};
use crate::config::SiteConfig;
use crate::graph::NodeActions;

/// Name of the field holding the public URL path
pub const SLUG_FIELD: &str = "slug";

/// Name of the field holding the path from the root marker
pub const RELATIVE_PATH_FIELD: &str = "relativePath";

/// Settings for field derivation
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    pub base_path: String,
    pub relative_path_marker: String,
    pub trailing_slash: bool,
}

impl DiscoveryOptions {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            base_path: config.base_path.clone(),
            relative_path_marker: config.relative_path_marker.clone(),
            trailing_slash: config.trailing_slash,
        }
    }
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self::from_config(&SiteConfig::default())
    }
}

/// Node creation hook. Documents get `slug` and `relativePath`; every other node passes through.
pub fn on_create_node<A>(node: &ContentNode, actions: &mut A, options: &DiscoveryOptions)
where
    A: NodeActions + ?Sized,
{
    match node {
        ContentNode::Mdx(mdx) => discover_document(mdx, actions, options),
        ContentNode::File(_) => {}
    }
}

fn discover_document<A>(mdx: &MdxNode, actions: &mut A, options: &DiscoveryOptions)
where
    A: NodeActions + ?Sized,
{
    let slug = actions
        .get_node(&mdx.parent)
        .and_then(ContentNode::as_file)
        .map(|file| {
            derive_slug(
                &file.relative_path,
                &options.base_path,
                options.trailing_slash,
            )
        });

    match slug {
        Some(slug) if !slug.is_empty() => {
            actions.create_node_field(&mdx.id, SLUG_FIELD, slug);
        }
        _ => tracing::debug!("No slug derived for {}", mdx.id),
    }

    match relative_path_from_marker(&mdx.file_absolute_path, &options.relative_path_marker) {
        Some(relative_path) if !relative_path.is_empty() => {
            actions.create_node_field(&mdx.id, RELATIVE_PATH_FIELD, relative_path);
        }
        _ => tracing::debug!(
            "{:?} does not contain {:?}, leaving {} without a relative path",
            mdx.file_absolute_path,
            options.relative_path_marker,
            mdx.id
        ),
    }
}
