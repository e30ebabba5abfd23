//! List site content

use anyhow::Result;

use crate::commands::build::materialize;
use crate::content::discovery::{RELATIVE_PATH_FIELD, SLUG_FIELD};
use crate::content::loader::ContentLoader;
use crate::Site;

/// List site content by type
pub fn run(site: &Site, content_type: &str) -> Result<()> {
    match content_type {
        "node" | "nodes" => {
            let graph = ContentLoader::new(site)?.load()?;
            println!("Nodes ({}):", graph.len());
            for node in graph.nodes() {
                let fields = node.fields();
                match (fields.get(SLUG_FIELD), fields.get(RELATIVE_PATH_FIELD)) {
                    (Some(slug), Some(rp)) => println!("  {} -> {} [{}]", node.id(), slug, rp),
                    (Some(slug), None) => println!("  {} -> {}", node.id(), slug),
                    _ => println!("  {}", node.id()),
                }
            }
        }
        "page" | "pages" | "route" | "routes" => {
            let (_, registry, reporter) = materialize(site)?;
            println!("Pages ({}):", registry.len());
            for page in registry.pages() {
                println!(
                    "  {} [{}]",
                    page.path,
                    page.context.relative_path.as_deref().unwrap_or("-")
                );
            }
            if reporter.warnings() > 0 {
                println!("Warnings: {}", reporter.warnings());
            }
        }
        _ => {
            anyhow::bail!("Unknown type: {}. Available: node, page", content_type);
        }
    }

    Ok(())
}
