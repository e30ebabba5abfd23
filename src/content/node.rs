//! Content graph nodes

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use super::FrontMatter;

/// Internal type name of file nodes
pub const FILE_TYPE: &str = "File";

/// Internal type name of document nodes, the only type that gets routed
pub const MDX_TYPE: &str = "Mdx";

/// Stable identifier of a node within one build
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Id of the file node for a source-relative path
    pub fn file(relative_path: &str) -> Self {
        Self(format!("{}:{}", FILE_TYPE, relative_path))
    }

    /// Id of the document node backed by a source-relative path
    pub fn mdx(relative_path: &str) -> Self {
        Self(format!("{}:{}", MDX_TYPE, relative_path))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fields attached to a node after creation, in attachment order
pub type NodeFields = IndexMap<String, String>;

/// A file found under the source directory
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileNode {
    pub id: NodeId,
    pub absolute_path: PathBuf,
    /// Path relative to the source directory, always `/`-separated
    pub relative_path: String,
    pub relative_directory: String,
    pub name: String,
    pub extension: String,
    pub fields: NodeFields,
}

impl FileNode {
    pub fn new(absolute_path: PathBuf, relative_path: String) -> Self {
        let (relative_directory, base) = match relative_path.rsplit_once('/') {
            Some((dir, base)) => (dir.to_string(), base),
            None => (String::new(), relative_path.as_str()),
        };
        let (name, extension) = match base.rfind('.') {
            Some(i) if i > 0 => (base[..i].to_string(), base[i + 1..].to_string()),
            _ => (base.to_string(), String::new()),
        };

        Self {
            id: NodeId::file(&relative_path),
            absolute_path,
            relative_path,
            relative_directory,
            name,
            extension,
            fields: NodeFields::new(),
        }
    }
}

/// A Markdown/MDX document, child of the file it was read from
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MdxNode {
    pub id: NodeId,
    pub parent: NodeId,
    pub file_absolute_path: PathBuf,
    pub frontmatter: FrontMatter,
    /// Raw document body after the front-matter
    pub body: String,
    pub fields: NodeFields,
}

impl MdxNode {
    pub fn new(file: &FileNode, frontmatter: FrontMatter, body: String) -> Self {
        Self {
            id: NodeId::mdx(&file.relative_path),
            parent: file.id.clone(),
            file_absolute_path: file.absolute_path.clone(),
            frontmatter,
            body,
            fields: NodeFields::new(),
        }
    }

    pub fn slug(&self) -> Option<&str> {
        self.fields.get("slug").map(String::as_str)
    }

    pub fn relative_path(&self) -> Option<&str> {
        self.fields.get("relativePath").map(String::as_str)
    }
}

/// A node of the content graph, tagged by its internal type
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "internalType")]
pub enum ContentNode {
    File(FileNode),
    Mdx(MdxNode),
}

impl ContentNode {
    pub fn id(&self) -> &NodeId {
        match self {
            ContentNode::File(file) => &file.id,
            ContentNode::Mdx(mdx) => &mdx.id,
        }
    }

    pub fn internal_type(&self) -> &'static str {
        match self {
            ContentNode::File(_) => FILE_TYPE,
            ContentNode::Mdx(_) => MDX_TYPE,
        }
    }

    pub fn fields(&self) -> &NodeFields {
        match self {
            ContentNode::File(file) => &file.fields,
            ContentNode::Mdx(mdx) => &mdx.fields,
        }
    }

    pub fn fields_mut(&mut self) -> &mut NodeFields {
        match self {
            ContentNode::File(file) => &mut file.fields,
            ContentNode::Mdx(mdx) => &mut mdx.fields,
        }
    }

    pub fn as_file(&self) -> Option<&FileNode> {
        match self {
            ContentNode::File(file) => Some(file),
            _ => None,
        }
    }

    pub fn as_mdx(&self) -> Option<&MdxNode> {
        match self {
            ContentNode::Mdx(mdx) => Some(mdx),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_node_splits_path() {
        let file = FileNode::new(
            PathBuf::from("/site/src/content/01-intro/index.mdx"),
            "content/01-intro/index.mdx".to_string(),
        );
        assert_eq!(file.id.as_str(), "File:content/01-intro/index.mdx");
        assert_eq!(file.relative_directory, "content/01-intro");
        assert_eq!(file.name, "index");
        assert_eq!(file.extension, "mdx");
    }

    #[test]
    fn test_file_node_without_extension() {
        let file = FileNode::new(PathBuf::from("/site/src/LICENSE"), "LICENSE".to_string());
        assert_eq!(file.relative_directory, "");
        assert_eq!(file.name, "LICENSE");
        assert_eq!(file.extension, "");

        let dotfile = FileNode::new(PathBuf::from("/site/src/.env"), ".env".to_string());
        assert_eq!(dotfile.name, ".env");
        assert_eq!(dotfile.extension, "");
    }

    #[test]
    fn test_serialized_shape() {
        let file = FileNode::new(
            PathBuf::from("/site/src/content/post.mdx"),
            "content/post.mdx".to_string(),
        );
        let mut mdx = MdxNode::new(&file, FrontMatter::default(), "Hello".to_string());
        mdx.fields.insert("slug".to_string(), "/post/".to_string());

        let value = serde_json::to_value(ContentNode::Mdx(mdx)).unwrap();
        assert_eq!(value["internalType"], "Mdx");
        assert_eq!(value["parent"], "File:content/post.mdx");
        assert_eq!(value["fileAbsolutePath"], "/site/src/content/post.mdx");
        assert_eq!(value["fields"]["slug"], "/post/");
        assert!(value["frontmatter"]["title"].is_null());
    }
}
