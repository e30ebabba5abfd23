//! Page registry - the routes of one build

use indexmap::IndexMap;

use super::reporter::Reporter;
use super::Page;
use crate::config::DuplicateSlugPolicy;
use crate::error::BuildError;

/// Registered pages keyed by path, in first-registration order
#[derive(Debug)]
pub struct PageRegistry {
    pages: IndexMap<String, Page>,
    policy: DuplicateSlugPolicy,
}

impl PageRegistry {
    pub fn new(policy: DuplicateSlugPolicy) -> Self {
        Self {
            pages: IndexMap::new(),
            policy,
        }
    }

    /// Register a page, resolving a path collision according to the policy
    pub fn create_page(&mut self, page: Page, reporter: &mut Reporter) -> Result<(), BuildError> {
        if let Some(existing) = self.pages.get(&page.path) {
            match self.policy {
                DuplicateSlugPolicy::Error => {
                    return Err(BuildError::DuplicatePath { path: page.path });
                }
                DuplicateSlugPolicy::Warn => reporter.warn(format!(
                    "Page path {} is used by {} and {}; keeping the latter",
                    page.path,
                    describe(existing),
                    describe(&page)
                )),
                DuplicateSlugPolicy::Overwrite => {}
            }
        }

        tracing::debug!("Created page {} ({})", page.path, page.component);
        self.pages.insert(page.path.clone(), page);
        Ok(())
    }

    pub fn get(&self, path: &str) -> Option<&Page> {
        self.pages.get(path)
    }

    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.pages.values()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

fn describe(page: &Page) -> String {
    page.context
        .relative_path
        .clone()
        .or_else(|| page.context.title.clone())
        .unwrap_or_else(|| "an unnamed document".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::PageContext;

    fn page(path: &str, title: &str) -> Page {
        Page {
            path: path.to_string(),
            component: "blog_post.html".to_string(),
            context: PageContext {
                relative_path: None,
                title: Some(title.to_string()),
            },
        }
    }

    #[test]
    fn test_warn_keeps_latest_and_reports() {
        let mut registry = PageRegistry::new(DuplicateSlugPolicy::Warn);
        let mut reporter = Reporter::new();
        registry.create_page(page("/a/", "First"), &mut reporter).unwrap();
        registry.create_page(page("/b/", "Other"), &mut reporter).unwrap();
        registry.create_page(page("/a/", "Second"), &mut reporter).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.get("/a/").unwrap().context.title.as_deref(),
            Some("Second")
        );
        // overwriting keeps the original position
        let paths: Vec<_> = registry.pages().map(|p| p.path.as_str()).collect();
        assert_eq!(paths, vec!["/a/", "/b/"]);
        assert_eq!(reporter.warnings(), 1);
        assert!(reporter.diagnostics()[0].message.contains("First"));
    }

    #[test]
    fn test_error_policy_rejects_duplicates() {
        let mut registry = PageRegistry::new(DuplicateSlugPolicy::Error);
        let mut reporter = Reporter::new();
        registry.create_page(page("/a/", "First"), &mut reporter).unwrap();
        let err = registry
            .create_page(page("/a/", "Second"), &mut reporter)
            .unwrap_err();

        assert!(matches!(err, BuildError::DuplicatePath { ref path } if path == "/a/"));
        assert_eq!(
            registry.get("/a/").unwrap().context.title.as_deref(),
            Some("First")
        );
    }

    #[test]
    fn test_overwrite_policy_is_silent() {
        let mut registry = PageRegistry::new(DuplicateSlugPolicy::Overwrite);
        let mut reporter = Reporter::new();
        registry.create_page(page("/a/", "First"), &mut reporter).unwrap();
        registry.create_page(page("/a/", "Second"), &mut reporter).unwrap();

        assert_eq!(registry.len(), 1);
        assert!(reporter.diagnostics().is_empty());
    }
}
