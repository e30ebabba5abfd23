//! Content graph - the nodes of one build and the queries run against them

pub mod query;
mod schema;

use indexmap::IndexMap;
use serde_json::Value;

use crate::content::{ContentNode, MdxNode, NodeId};
use crate::error::QueryError;
use query::parse_query;
use schema::ObjectShape;

/// Node operations available to hooks while a node is being created
pub trait NodeActions {
    /// Look up another node, typically the parent file of a document
    fn get_node(&self, id: &NodeId) -> Option<&ContentNode>;

    /// Attach a derived field to a node
    fn create_node_field(&mut self, node_id: &NodeId, name: &str, value: String);
}

/// A field attachment requested by a hook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeFieldAction {
    pub node_id: NodeId,
    pub name: String,
    pub value: String,
}

/// Collects actions against a read-only graph; the graph applies them afterwards
pub struct BufferedActions<'a> {
    graph: &'a ContentGraph,
    pending: Vec<NodeFieldAction>,
}

impl BufferedActions<'_> {
    pub fn into_pending(self) -> Vec<NodeFieldAction> {
        self.pending
    }
}

impl NodeActions for BufferedActions<'_> {
    fn get_node(&self, id: &NodeId) -> Option<&ContentNode> {
        self.graph.get(id)
    }

    fn create_node_field(&mut self, node_id: &NodeId, name: &str, value: String) {
        self.pending.push(NodeFieldAction {
            node_id: node_id.clone(),
            name: name.to_string(),
            value,
        });
    }
}

/// Result of a query: data when the selection resolved, errors when anything went wrong
#[derive(Debug, Clone, Default)]
pub struct QueryResponse {
    pub data: Option<Vec<Value>>,
    pub errors: Vec<QueryError>,
}

impl QueryResponse {
    fn failed(errors: Vec<QueryError>) -> Self {
        Self { data: None, errors }
    }

    /// Any reported error fails the whole response
    pub fn into_result(self) -> Result<Vec<Value>, Vec<QueryError>> {
        if self.errors.is_empty() {
            Ok(self.data.unwrap_or_default())
        } else {
            Err(self.errors)
        }
    }
}

/// All nodes of a build, in creation order
#[derive(Debug, Default)]
pub struct ContentGraph {
    nodes: IndexMap<NodeId, ContentNode>,
    node_errors: IndexMap<NodeId, Vec<String>>,
}

impl ContentGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: &NodeId) -> Option<&ContentNode> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &ContentNode> {
        self.nodes.values()
    }

    pub fn nodes_of_type<'a>(
        &'a self,
        type_name: &'a str,
    ) -> impl Iterator<Item = &'a ContentNode> {
        self.nodes
            .values()
            .filter(move |node| node.internal_type() == type_name)
    }

    /// Find the document whose `relativePath` field matches
    pub fn find_mdx_by_relative_path(&self, relative_path: &str) -> Option<&MdxNode> {
        self.nodes
            .values()
            .filter_map(ContentNode::as_mdx)
            .find(|mdx| mdx.relative_path() == Some(relative_path))
    }

    /// Insert a node, then run `on_create` for it with an action buffer
    pub fn create_node<F>(&mut self, node: ContentNode, on_create: F)
    where
        F: FnOnce(&ContentNode, &mut BufferedActions<'_>),
    {
        let id = node.id().clone();
        if self.nodes.insert(id.clone(), node).is_some() {
            tracing::warn!("Node {} was created twice, keeping the latest", id);
        }

        let pending = match self.nodes.get(&id) {
            Some(node) => {
                let mut actions = BufferedActions {
                    graph: &*self,
                    pending: Vec::new(),
                };
                on_create(node, &mut actions);
                actions.into_pending()
            }
            None => Vec::new(),
        };

        self.apply(pending);
    }

    /// Attach buffered fields to their nodes
    pub fn apply(&mut self, actions: Vec<NodeFieldAction>) {
        for action in actions {
            let Some(node) = self.nodes.get_mut(&action.node_id) else {
                tracing::warn!(
                    "Cannot attach field `{}` to missing node {}",
                    action.name,
                    action.node_id
                );
                continue;
            };
            tracing::debug!("{}: {} = {}", action.node_id, action.name, action.value);
            if let Some(previous) = node.fields_mut().insert(action.name.clone(), action.value) {
                tracing::warn!(
                    "Field `{}` of node {} replaced (was {:?})",
                    action.name,
                    action.node_id,
                    previous
                );
            }
        }
    }

    /// Remember a problem found while creating a node; queries over its type will fail
    pub fn record_node_error(&mut self, id: &NodeId, message: impl Into<String>) {
        self.node_errors
            .entry(id.clone())
            .or_default()
            .push(message.into());
    }

    /// Run a query string against the graph
    pub fn run_query(&self, src: &str) -> QueryResponse {
        let query = match parse_query(src) {
            Ok(query) => query,
            Err(e) => return QueryResponse::failed(vec![e]),
        };

        let Some(mut shape) = ObjectShape::declared(&query.node_type) else {
            return QueryResponse::failed(vec![QueryError::UnknownType(query.node_type)]);
        };

        let mut serialized = Vec::new();
        for node in self.nodes_of_type(&query.node_type) {
            match serde_json::to_value(node) {
                Ok(Value::Object(map)) => {
                    shape.infer(&map);
                    serialized.push(Value::Object(map));
                }
                Ok(_) => {}
                Err(e) => {
                    return QueryResponse::failed(vec![QueryError::Node {
                        id: node.id().clone(),
                        message: e.to_string(),
                    }])
                }
            }
        }

        let mut errors = Vec::new();
        shape.validate(&query.node_type, &query.selection, "", &mut errors);
        if !errors.is_empty() {
            return QueryResponse::failed(errors);
        }

        for (id, messages) in &self.node_errors {
            let matches_type = self
                .get(id)
                .map(|node| node.internal_type() == query.node_type)
                .unwrap_or(false);
            if matches_type {
                errors.extend(messages.iter().map(|message| QueryError::Node {
                    id: id.clone(),
                    message: message.clone(),
                }));
            }
        }

        let data = serialized
            .iter()
            .map(|value| schema::project(value, &query.selection))
            .collect();

        QueryResponse {
            data: Some(data),
            errors,
        }
    }
}

impl NodeActions for ContentGraph {
    fn get_node(&self, id: &NodeId) -> Option<&ContentNode> {
        self.get(id)
    }

    fn create_node_field(&mut self, node_id: &NodeId, name: &str, value: String) {
        self.apply(vec![NodeFieldAction {
            node_id: node_id.clone(),
            name: name.to_string(),
            value,
        }]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{FileNode, FrontMatter};
    use serde_json::json;
    use std::path::PathBuf;

    fn add_document(graph: &mut ContentGraph, relative_path: &str, title: &str) -> NodeId {
        let file = FileNode::new(
            PathBuf::from(format!("/site/src/{}", relative_path)),
            relative_path.to_string(),
        );
        let frontmatter = FrontMatter {
            title: Some(title.to_string()),
            ..Default::default()
        };
        let mdx = MdxNode::new(&file, frontmatter, String::new());
        let id = mdx.id.clone();
        graph.create_node(ContentNode::File(file), |_, _| {});
        graph.create_node(ContentNode::Mdx(mdx), |_, _| {});
        id
    }

    #[test]
    fn test_create_node_applies_buffered_fields() {
        let mut graph = ContentGraph::new();
        let file = FileNode::new(PathBuf::from("/site/src/a.md"), "a.md".to_string());
        let file_id = file.id.clone();
        graph.create_node(ContentNode::File(file), |node, actions| {
            assert!(actions.get_node(node.id()).is_some());
            actions.create_node_field(node.id(), "kind", "asset".to_string());
        });

        let node = graph.get(&file_id).unwrap();
        assert_eq!(node.fields().get("kind").map(String::as_str), Some("asset"));
    }

    #[test]
    fn test_query_selects_documents_in_creation_order() {
        let mut graph = ContentGraph::new();
        let first = add_document(&mut graph, "content/b.mdx", "B");
        add_document(&mut graph, "content/a.mdx", "A");
        graph.create_node_field(&first, "slug", "/b/".to_string());

        let data = graph
            .run_query("allMdx { frontmatter { title } fields { slug } }")
            .into_result()
            .unwrap();

        assert_eq!(
            data,
            vec![
                json!({ "frontmatter": { "title": "B" }, "fields": { "slug": "/b/" } }),
                json!({ "frontmatter": { "title": "A" }, "fields": { "slug": null } }),
            ]
        );
    }

    #[test]
    fn test_query_on_empty_graph_returns_no_rows() {
        let graph = ContentGraph::new();
        let data = graph
            .run_query("allMdx { fields { slug } }")
            .into_result()
            .unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn test_query_errors() {
        let graph = ContentGraph::new();

        let response = graph.run_query("allPost { id }");
        assert!(response.data.is_none());
        assert_eq!(
            response.errors,
            vec![QueryError::UnknownType("Post".to_string())]
        );

        let errors = graph
            .run_query("allMdx { fields { author } }")
            .into_result()
            .unwrap_err();
        assert_eq!(errors.len(), 1);

        assert!(graph.run_query("allMdx {").into_result().is_err());
    }

    #[test]
    fn test_node_errors_fail_queries_of_their_type_only() {
        let mut graph = ContentGraph::new();
        let id = add_document(&mut graph, "content/broken.mdx", "Broken");
        graph.record_node_error(&id, "invalid front-matter");

        let response = graph.run_query("allMdx { id }");
        assert_eq!(response.data.as_ref().map(Vec::len), Some(1));
        assert_eq!(
            response.errors,
            vec![QueryError::Node {
                id: id.clone(),
                message: "invalid front-matter".to_string()
            }]
        );

        assert!(graph.run_query("allFile { relativePath }").into_result().is_ok());
    }

    #[test]
    fn test_find_mdx_by_relative_path() {
        let mut graph = ContentGraph::new();
        let id = add_document(&mut graph, "content/post.mdx", "Post");
        graph.create_node_field(&id, "relativePath", "src/content/post.mdx".to_string());

        let found = graph.find_mdx_by_relative_path("src/content/post.mdx").unwrap();
        assert_eq!(found.id, id);
        assert!(graph.find_mdx_by_relative_path("src/other.mdx").is_none());
    }
}
