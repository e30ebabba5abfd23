//! Path to route conversions used by content discovery

use lazy_static::lazy_static;
use regex::Regex;
use std::path::{Path, MAIN_SEPARATOR};

lazy_static! {
    /// One or more `<digits>-` groups at the start of a path segment
    static ref ORDERING_PREFIX: Regex = Regex::new(r"^(?:[0-9]+-)+").unwrap();
}

/// Build the URL path of a file from its source-relative path.
///
/// The `base_path` directory is removed from the front, the extension is
/// dropped and an `index` file collapses to its directory.
///
/// ```ignore
/// create_file_path("content/01-intro/index.mdx", "content", true) // -> "/01-intro/"
/// create_file_path("content/about.md", "content", false)          // -> "/about"
/// ```
pub fn create_file_path(relative_path: &str, base_path: &str, trailing_slash: bool) -> String {
    let relative_path = relative_path.trim_start_matches('/');
    let base = base_path.trim_matches('/');

    let within_base = if base.is_empty() {
        relative_path
    } else {
        relative_path
            .strip_prefix(base)
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(relative_path)
    };

    let (dir, file_name) = match within_base.rsplit_once('/') {
        Some((dir, file_name)) => (dir, file_name),
        None => ("", within_base),
    };
    let name = match file_name.rfind('.') {
        Some(i) if i > 0 => &file_name[..i],
        _ => file_name,
    };
    let name = if name == "index" { "" } else { name };

    let segments: Vec<&str> = dir
        .split('/')
        .chain(std::iter::once(name))
        .filter(|s| !s.is_empty())
        .collect();

    if segments.is_empty() {
        return "/".to_string();
    }

    let mut path = format!("/{}", segments.join("/"));
    if trailing_slash {
        path.push('/');
    }
    path
}

/// Remove numeric ordering prefixes (`01-`, `2024-05-`) from every path segment.
///
/// Only a run at the start of a segment counts as a prefix. Digits followed by
/// `-` inside a segment stay, so `v2-api` and `covid-19-update` keep their
/// names, unlike a global `\d+-` replacement that would yield `vapi`.
pub fn strip_ordering_prefixes(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').collect();
    let last = segments.len().saturating_sub(1);

    segments
        .iter()
        .enumerate()
        .filter_map(|(i, segment)| {
            let stripped = ORDERING_PREFIX.replace(segment, "");
            // Leading and trailing empties carry the surrounding slashes
            if stripped.is_empty() && i != 0 && i != last {
                None
            } else {
                Some(stripped.into_owned())
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Slug of a document backed by the given source-relative path
pub fn derive_slug(relative_path: &str, base_path: &str, trailing_slash: bool) -> String {
    strip_ordering_prefixes(&create_file_path(relative_path, base_path, trailing_slash))
}

/// Suffix of `absolute_path` starting at the first occurrence of `marker`
pub fn relative_path_from_marker(absolute_path: &Path, marker: &str) -> Option<String> {
    let path = to_slash(absolute_path);
    path.find(marker).map(|start| path[start..].to_string())
}

/// Render a path with `/` separators
pub fn to_slash(path: &Path) -> String {
    let path = path.to_string_lossy();
    if MAIN_SEPARATOR == '/' {
        path.into_owned()
    } else {
        path.replace(MAIN_SEPARATOR, "/")
    }
}
