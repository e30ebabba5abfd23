//! Build the site

use anyhow::Result;
use notify::{RecursiveMode, Watcher};
use std::path::PathBuf;
use std::sync::mpsc::{channel, RecvTimeoutError};
use std::time::{Duration, Instant};

use crate::content::loader::ContentLoader;
use crate::generator::Generator;
use crate::graph::ContentGraph;
use crate::pages::registry::PageRegistry;
use crate::pages::reporter::Reporter;
use crate::pages::create_pages;
use crate::{Site, CONFIG_FILE};

/// What a build produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub nodes: usize,
    pub pages: usize,
    pub assets: usize,
    pub warnings: usize,
}

/// Ingest the content and register its pages, without writing anything
pub fn materialize(site: &Site) -> Result<(ContentGraph, PageRegistry, Reporter)> {
    let graph = ContentLoader::new(site)?.load()?;

    let mut registry = PageRegistry::new(site.config.duplicate_slugs);
    let mut reporter = Reporter::new();
    create_pages(&graph, &mut registry, &mut reporter)?;

    Ok((graph, registry, reporter))
}

/// Build the whole site into the public directory
pub fn run(site: &Site) -> Result<BuildSummary> {
    let start = Instant::now();

    let (graph, registry, reporter) = materialize(site)?;
    let generated = Generator::new(site)?.generate(&graph, &registry)?;

    let summary = BuildSummary {
        nodes: graph.len(),
        pages: generated.pages,
        assets: generated.assets,
        warnings: reporter.warnings(),
    };

    tracing::info!(
        "Built {} pages and {} assets in {:.2}s ({} warnings)",
        summary.pages,
        summary.assets,
        start.elapsed().as_secs_f64(),
        summary.warnings
    );

    Ok(summary)
}

/// Paths a rebuild depends on, limited to those that exist
pub(crate) fn watch_targets(site: &Site) -> Vec<(PathBuf, RecursiveMode)> {
    let mut targets = Vec::new();
    if site.source_dir.exists() {
        targets.push((site.source_dir.clone(), RecursiveMode::Recursive));
    }
    let config_path = site.base_dir.join(CONFIG_FILE);
    if config_path.exists() {
        targets.push((config_path, RecursiveMode::NonRecursive));
    }
    targets
}

/// Rebuild whenever the sources or the config change. Blocks until the watcher stops.
pub fn watch(site: &Site) -> Result<()> {
    let targets = watch_targets(site);
    if targets.is_empty() {
        anyhow::bail!(
            "Nothing to watch: neither {:?} nor {} exists",
            site.source_dir,
            CONFIG_FILE
        );
    }

    let (tx, rx) = channel();

    let mut watcher = notify::recommended_watcher(move |res| {
        if let Ok(event) = res {
            let _ = tx.send(event);
        }
    })?;

    for (path, mode) in &targets {
        watcher.watch(path, *mode)?;
        tracing::debug!("Watching: {:?}", path);
    }

    tracing::info!("Watching {:?} for changes. Press Ctrl+C to stop.", site.source_dir);

    let mut last_rebuild = Instant::now();

    loop {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => {
                let relevant = event
                    .paths
                    .iter()
                    .any(|p| !p.starts_with(&site.public_dir));
                // Debounce bursts of events from a single save
                if relevant && last_rebuild.elapsed() > Duration::from_millis(500) {
                    tracing::info!("Change detected, rebuilding...");
                    // Reopen the site so config edits take effect
                    if let Err(e) = Site::new(&site.base_dir).and_then(|site| run(&site)) {
                        tracing::error!("Build failed: {:#}", e);
                    }
                    last_rebuild = Instant::now();
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    Ok(())
}
