//! Content module - ingestion, front-matter, documents and their routing fields

pub mod discovery;
pub mod file_path;
mod frontmatter;
pub mod loader;
mod markdown;
mod node;

pub use frontmatter::FrontMatter;
pub use markdown::MarkdownRenderer;
pub use node::{ContentNode, FileNode, MdxNode, NodeFields, NodeId, FILE_TYPE, MDX_TYPE};
