//! Typed errors for the build pipeline

use thiserror::Error;

use crate::content::NodeId;

/// An error reported by the content graph query engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    #[error("unknown node type `{0}`")]
    UnknownType(String),

    #[error("cannot query field `{path}` on type `{type_name}`")]
    UnknownField { type_name: String, path: String },

    #[error("field `{path}` of type `{type_name}` must have a selection of subfields")]
    MissingSelection { type_name: String, path: String },

    #[error("field `{path}` of type `{type_name}` is a scalar and cannot have subfields")]
    ScalarSelection { type_name: String, path: String },

    #[error("node {id}: {message}")]
    Node { id: NodeId, message: String },
}

/// Errors that abort a build
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("{message}: {}", join_errors(.errors))]
    QueryFailed {
        message: String,
        errors: Vec<QueryError>,
    },

    #[error("page path `{path}` is already registered")]
    DuplicatePath { path: String },

    #[error("malformed query result row: {0}")]
    MalformedRow(#[from] serde_json::Error),
}

fn join_errors(errors: &[QueryError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
