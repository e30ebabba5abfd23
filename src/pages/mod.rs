//! Page materialization - one page per document, created from a graph query

pub mod registry;
pub mod reporter;

use serde::{Deserialize, Serialize};

use crate::error::BuildError;
use crate::graph::ContentGraph;
use crate::templates::BLOG_POST_TEMPLATE;
use registry::PageRegistry;
use reporter::Reporter;

/// Data every document page needs
pub const PAGES_QUERY: &str = r#"
query {
    allMdx {
        edges {
            node {
                frontmatter {
                    title
                }
                fields {
                    relativePath
                    slug
                }
            }
        }
    }
}
"#;

/// One generated route
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    /// URL path
    pub path: String,
    /// Template the page is rendered with
    pub component: String,
    /// Passed as-is to the template
    pub context: PageContext,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageContext {
    pub relative_path: Option<String>,
    pub title: Option<String>,
}

/// A row of the pages query
#[derive(Debug, Deserialize)]
struct PageRow {
    frontmatter: Option<RowFrontmatter>,
    fields: Option<RowFields>,
}

#[derive(Debug, Deserialize)]
struct RowFrontmatter {
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RowFields {
    relative_path: Option<String>,
    slug: Option<String>,
}

/// Query every document and register one page for each.
///
/// A failing query stops the build before any page is created.
pub fn create_pages(
    graph: &ContentGraph,
    registry: &mut PageRegistry,
    reporter: &mut Reporter,
) -> Result<usize, BuildError> {
    let rows = graph
        .run_query(PAGES_QUERY)
        .into_result()
        .map_err(|errors| reporter.panic_on_build("ERROR: Loading \"createPages\" query", errors))?;

    let mut created = 0;
    for row in rows {
        let row: PageRow = serde_json::from_value(row)?;
        let (relative_path, slug) = match row.fields {
            Some(fields) => (fields.relative_path, fields.slug),
            None => (None, None),
        };
        let title = row.frontmatter.and_then(|fm| fm.title);

        let Some(path) = slug else {
            reporter.warn(format!(
                "Document {} has no slug, no page created",
                relative_path
                    .as_deref()
                    .or(title.as_deref())
                    .unwrap_or("<untitled>")
            ));
            continue;
        };

        registry.create_page(
            Page {
                path,
                component: BLOG_POST_TEMPLATE.to_string(),
                context: PageContext {
                    relative_path,
                    title,
                },
            },
            reporter,
        )?;
        created += 1;
    }

    tracing::info!("Created {} pages", created);
    Ok(created)
}
