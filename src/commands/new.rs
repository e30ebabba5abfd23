//! Create a new document

use anyhow::Result;
use lazy_static::lazy_static;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

use crate::Site;

lazy_static! {
    static ref LEADING_NUMBER: Regex = Regex::new(r"^([0-9]+)-").unwrap();
}

/// Create a document after the last one of its directory.
///
/// The file is named `NN-<slugified title>.mdx`, where `NN` follows the highest
/// ordering prefix already present, so the new document sorts last but
/// ordering prefixes never reach its slug.
pub fn create_document(site: &Site, title: &str, dir: Option<&str>) -> Result<PathBuf> {
    let mut target_dir = site.source_dir.join(&site.config.base_path);
    if let Some(dir) = dir {
        target_dir = target_dir.join(dir.trim_matches('/'));
    }
    fs::create_dir_all(&target_dir)?;

    let slug = slug::slugify(title);
    if slug.is_empty() {
        anyhow::bail!("Title {:?} has nothing to build a file name from", title);
    }

    let file_path = target_dir.join(format!("{}-{}.mdx", next_prefix(&target_dir)?, slug));
    if file_path.exists() {
        anyhow::bail!("File already exists: {:?}", file_path);
    }

    let now = chrono::Local::now();
    let content = format!(
        "---\ntitle: {}\ndate: {}\n---\n",
        serde_yaml::to_string(title)?.trim_end(),
        now.format("%Y-%m-%d %H:%M:%S")
    );
    fs::write(&file_path, content)?;

    tracing::info!("Created: {:?}", file_path);

    Ok(file_path)
}

/// Next ordering prefix, zero-padded to at least two digits
fn next_prefix(dir: &Path) -> Result<String> {
    let mut highest: Option<(u64, usize)> = None;

    for entry in fs::read_dir(dir)? {
        let name = entry?.file_name();
        let name = name.to_string_lossy();
        if let Some(caps) = LEADING_NUMBER.captures(&name) {
            let digits = &caps[1];
            if let Ok(n) = digits.parse::<u64>() {
                if highest.map_or(true, |(h, _)| n > h) {
                    highest = Some((n, digits.len()));
                }
            }
        }
    }

    let (next, width) = match highest {
        Some((n, width)) => (n + 1, width.max(2)),
        None => (1, 2),
    };

    Ok(format!("{:0width$}", next, width = width))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::FrontMatter;

    #[test]
    fn test_first_document_gets_prefix_01() {
        let dir = tempfile::tempdir().unwrap();
        let site = Site::new(dir.path()).unwrap();

        let path = create_document(&site, "Getting Started", None).unwrap();
        assert_eq!(
            path,
            dir.path().join("src/content/01-getting-started.mdx")
        );

        let content = fs::read_to_string(&path).unwrap();
        let (fm, _) = FrontMatter::parse(&content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Getting Started"));
        assert!(fm.parse_date().is_some());
    }

    #[test]
    fn test_prefix_follows_highest_sibling() {
        let dir = tempfile::tempdir().unwrap();
        let site = Site::new(dir.path()).unwrap();
        let guide = dir.path().join("src/content/guide");
        fs::create_dir_all(guide.join("03-advanced")).unwrap();
        fs::write(guide.join("01-intro.mdx"), "").unwrap();
        fs::write(guide.join("notes.mdx"), "").unwrap();

        let path = create_document(&site, "Q&A: Tokens", Some("guide")).unwrap();
        assert_eq!(path.file_name().unwrap(), "04-q-a-tokens.mdx");

        let content = fs::read_to_string(&path).unwrap();
        let (fm, _) = FrontMatter::parse(&content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Q&A: Tokens"));
    }

    #[test]
    fn test_prefix_keeps_existing_width() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("009-old.mdx"), "").unwrap();
        assert_eq!(next_prefix(dir.path()).unwrap(), "010");
    }

    #[test]
    fn test_empty_title_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let site = Site::new(dir.path()).unwrap();
        assert!(create_document(&site, "!!!", None).is_err());
    }
}
