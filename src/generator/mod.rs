//! Generator module - renders registered pages into the public directory

use anyhow::{anyhow, Context as _, Result};
use std::fs;
use std::path::{Path, PathBuf};

use tera::Context;

use crate::content::{ContentNode, MarkdownRenderer, MdxNode};
use crate::graph::ContentGraph;
use crate::helpers::{full_url_for, url_for};
use crate::pages::registry::PageRegistry;
use crate::pages::Page;
use crate::templates::{PageData, RouteData, SiteData, TemplateRenderer, INDEX_TEMPLATE};
use crate::Site;

/// Route manifest written next to the pages
pub const ROUTES_FILE: &str = "routes.json";

/// What a generation pass wrote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateSummary {
    pub pages: usize,
    pub assets: usize,
}

/// Static site generator using Tera templates
pub struct Generator<'a> {
    site: &'a Site,
    renderer: TemplateRenderer,
    markdown: MarkdownRenderer,
}

impl<'a> Generator<'a> {
    /// Create a new generator
    pub fn new(site: &'a Site) -> Result<Self> {
        Ok(Self {
            site,
            renderer: TemplateRenderer::new()?,
            markdown: MarkdownRenderer::from_config(&site.config.highlight),
        })
    }

    /// Write every page, the home page, the route manifest and the assets
    pub fn generate(
        &self,
        graph: &ContentGraph,
        registry: &PageRegistry,
    ) -> Result<GenerateSummary> {
        fs::create_dir_all(&self.site.public_dir)?;

        let assets = self.copy_assets(graph)?;
        let site_data = self.build_site_data();

        for page in registry.pages() {
            // Each template looks its document up by relative path
            let document = page
                .context
                .relative_path
                .as_deref()
                .and_then(|rp| graph.find_mdx_by_relative_path(rp));
            self.render_page(page, document, &site_data)?;
        }

        if registry.get("/").is_none() {
            self.render_index(registry, &site_data)?;
        }

        self.write_routes(registry)?;

        Ok(GenerateSummary {
            pages: registry.len(),
            assets,
        })
    }

    fn build_site_data(&self) -> SiteData {
        let config = &self.site.config;
        SiteData {
            title: config.title.clone(),
            description: config.description.clone(),
            author: config.author.clone(),
            url: config.url.clone(),
            root: config.root.clone(),
        }
    }

    fn create_base_context(&self, site_data: &SiteData) -> Context {
        let mut context = Context::new();
        context.insert("site", site_data);
        context.insert(
            "current_year",
            &chrono::Local::now().format("%Y").to_string(),
        );
        context
    }

    /// Render one page through its template
    fn render_page(
        &self,
        page: &Page,
        document: Option<&MdxNode>,
        site_data: &SiteData,
    ) -> Result<()> {
        if !self.renderer.has_template(&page.component) {
            return Err(anyhow!(
                "Page {} uses unknown template {}",
                page.path,
                page.component
            ));
        }

        let body = match document {
            Some(mdx) => mdx.body.as_str(),
            None => {
                tracing::warn!("Page {} has no document to render", page.path);
                ""
            }
        };
        let content = self.markdown.render(body)?;

        let mut context = self.create_base_context(site_data);
        context.insert(
            "page",
            &PageData {
                path: url_for(&self.site.config, &page.path),
                permalink: full_url_for(&self.site.config, &page.path),
                title: page.context.title.clone(),
                date: document
                    .and_then(|mdx| mdx.frontmatter.parse_date())
                    .map(|date| date.format("%Y-%m-%d").to_string()),
                relative_path: page.context.relative_path.clone().unwrap_or_default(),
            },
        );
        context.insert("content", &content);

        let html = self
            .renderer
            .render(&page.component, &context)
            .with_context(|| format!("Failed to render {}", page.path))?;

        let dest = output_path(&self.site.public_dir, &page.path);
        write_file(&dest, &html)?;
        tracing::debug!("Generated page: {:?}", dest);

        Ok(())
    }

    /// Home page listing every route
    fn render_index(&self, registry: &PageRegistry, site_data: &SiteData) -> Result<()> {
        let routes: Vec<RouteData> = registry
            .pages()
            .map(|page| RouteData {
                path: page.path.clone(),
                href: url_for(&self.site.config, &page.path),
                title: page
                    .context
                    .title
                    .clone()
                    .unwrap_or_else(|| page.path.clone()),
            })
            .collect();

        let mut context = self.create_base_context(site_data);
        context.insert("routes", &routes);

        let html = self.renderer.render(INDEX_TEMPLATE, &context)?;
        write_file(&self.site.public_dir.join("index.html"), &html)?;
        tracing::debug!("Generated index with {} routes", routes.len());

        Ok(())
    }

    fn write_routes(&self, registry: &PageRegistry) -> Result<()> {
        let pages: Vec<&Page> = registry.pages().collect();
        let json = serde_json::to_string_pretty(&pages)?;
        write_file(&self.site.public_dir.join(ROUTES_FILE), &json)?;
        tracing::info!("Generated {}", ROUTES_FILE);
        Ok(())
    }

    /// Copy non-document files to the public directory
    fn copy_assets(&self, graph: &ContentGraph) -> Result<usize> {
        let mut copied = 0;

        for file in graph.nodes().filter_map(ContentNode::as_file) {
            if self.site.config.is_document_extension(&file.extension) {
                continue;
            }

            let dest = output_file(&self.site.public_dir, &file.relative_path);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(&file.absolute_path, &dest)
                .with_context(|| format!("Failed to copy {:?}", file.absolute_path))?;
            copied += 1;
        }

        Ok(copied)
    }
}

/// Output file of a page path: `/a/b/` becomes `a/b/index.html`
fn output_path(public_dir: &Path, path: &str) -> PathBuf {
    if path.ends_with(".html") {
        output_file(public_dir, path)
    } else {
        output_file(public_dir, path).join("index.html")
    }
}

/// Join a `/`-separated path under the public dir, dropping anything that climbs out
fn output_file(public_dir: &Path, path: &str) -> PathBuf {
    path.split('/')
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .fold(public_dir.to_path_buf(), |acc, segment| acc.join(segment))
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create dir {:?}", parent))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))
}
