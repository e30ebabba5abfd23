//! Field shapes of node types, used to validate and resolve selections

use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::query::Selection;
use crate::content::{FILE_TYPE, MDX_TYPE};
use crate::error::QueryError;

/// Fields every node of a type exposes, whether or not a value is present
const FILE_FIELDS: &[&str] = &[
    "id",
    "internalType",
    "absolutePath",
    "relativePath",
    "relativeDirectory",
    "name",
    "extension",
];

const MDX_FIELDS: &[&str] = &[
    "id",
    "parent",
    "internalType",
    "fileAbsolutePath",
    "body",
    "frontmatter.title",
    "frontmatter.date",
    "frontmatter.description",
    "frontmatter.tags",
    "fields.slug",
    "fields.relativePath",
];

/// Shape of one field; scalars have no subfields
#[derive(Debug, Clone, Default)]
pub struct Shape {
    object: Option<ObjectShape>,
}

/// Named fields of an object, in declaration order
#[derive(Debug, Clone, Default)]
pub struct ObjectShape(IndexMap<String, Shape>);

impl ObjectShape {
    /// Declared shape of a node type, `None` for unknown types
    pub fn declared(type_name: &str) -> Option<Self> {
        let paths = match type_name {
            FILE_TYPE => FILE_FIELDS,
            MDX_TYPE => MDX_FIELDS,
            _ => return None,
        };

        let mut shape = ObjectShape::default();
        for path in paths {
            shape.add_path(path);
        }
        // fields is an object even before anything is attached
        shape.object_mut("fields");
        Some(shape)
    }

    /// The named field as an object, turning a scalar into one
    fn object_mut(&mut self, name: &str) -> &mut ObjectShape {
        self.0
            .entry(name.to_string())
            .or_default()
            .object
            .get_or_insert_with(ObjectShape::default)
    }

    fn add_path(&mut self, path: &str) {
        match path.split_once('.') {
            Some((head, rest)) => self.object_mut(head).add_path(rest),
            None => {
                self.0.entry(path.to_string()).or_default();
            }
        }
    }

    /// Extend the shape with every key present in a serialized node
    pub fn infer(&mut self, value: &Map<String, Value>) {
        for (key, value) in value {
            match value {
                Value::Object(map) => self.object_mut(key).infer(map),
                _ => {
                    self.0.entry(key.clone()).or_default();
                }
            }
        }
    }

    /// Check a selection against this shape, collecting every problem
    pub fn validate(
        &self,
        type_name: &str,
        selection: &[Selection],
        prefix: &str,
        errors: &mut Vec<QueryError>,
    ) {
        for field in selection {
            let path = if prefix.is_empty() {
                field.name.clone()
            } else {
                format!("{}.{}", prefix, field.name)
            };

            let shape = self.0.get(&field.name).map(|shape| shape.object.as_ref());
            match (shape, field.children.is_empty()) {
                (None, _) => errors.push(QueryError::UnknownField {
                    type_name: type_name.to_string(),
                    path,
                }),
                (Some(None), true) => {}
                (Some(None), false) => errors.push(QueryError::ScalarSelection {
                    type_name: type_name.to_string(),
                    path,
                }),
                (Some(Some(_)), true) => errors.push(QueryError::MissingSelection {
                    type_name: type_name.to_string(),
                    path,
                }),
                (Some(Some(object)), false) => {
                    object.validate(type_name, &field.children, &path, errors)
                }
            }
        }
    }
}

/// Pick the selected fields out of a serialized node; absent values become null
pub fn project(value: &Value, selection: &[Selection]) -> Value {
    let mut out = Map::new();
    for field in selection {
        let selected = match value.get(&field.name) {
            None => Value::Null,
            Some(v) if field.children.is_empty() => v.clone(),
            Some(v @ Value::Object(_)) => project(v, &field.children),
            Some(_) => Value::Null,
        };
        out.insert(field.name.clone(), selected);
    }
    Value::Object(out)
}
