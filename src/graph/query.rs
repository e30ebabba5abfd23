//! Query language for the content graph
//!
//! A query selects fields from every node of one type:
//!
//! ```text
//! query {
//!   allMdx {
//!     edges { node { frontmatter { title } fields { slug } } }
//!   }
//! }
//! ```
//!
//! The `query { ... }` wrapper is optional, and the connection levels
//! (`edges { node { ... } }` or `nodes { ... }`) may be left out, so
//! `allMdx { fields { slug } }` selects the same data.

use crate::error::QueryError;

/// A parsed query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Internal type of the selected nodes (`Mdx` for `allMdx`)
    pub node_type: String,
    /// Fields selected on every node
    pub selection: Vec<Selection>,
}

/// One selected field and its subfields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub name: String,
    pub children: Vec<Selection>,
}

impl Selection {
    pub fn leaf(name: &str) -> Self {
        Self {
            name: name.to_string(),
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Open,
    Close,
}

/// Parse a query string
pub fn parse_query(src: &str) -> Result<Query, QueryError> {
    let tokens = tokenize(src)?;
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        end: src.len(),
    };
    let query = parser.document()?;
    parser.expect_end()?;
    Ok(query)
}

fn tokenize(src: &str) -> Result<Vec<(Token, usize)>, QueryError> {
    let mut tokens = Vec::new();
    let mut chars = src.char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        match c {
            '{' => tokens.push((Token::Open, offset)),
            '}' => tokens.push((Token::Close, offset)),
            ',' => {}
            c if c.is_whitespace() => {}
            '#' => {
                while let Some((_, c)) = chars.peek() {
                    if *c == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut ident = String::from(c);
                while let Some((_, c)) = chars.peek() {
                    if c.is_ascii_alphanumeric() || *c == '_' {
                        ident.push(*c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push((Token::Ident(ident), offset));
            }
            other => {
                return Err(QueryError::Syntax {
                    offset,
                    message: format!("unexpected character `{}`", other),
                })
            }
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [(Token, usize)],
    pos: usize,
    end: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map(|(_, o)| *o).unwrap_or(self.end)
    }

    fn next(&mut self) -> Option<(Token, usize)> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn error(&self, message: impl Into<String>) -> QueryError {
        QueryError::Syntax {
            offset: self.offset(),
            message: message.into(),
        }
    }

    fn document(&mut self) -> Result<Query, QueryError> {
        let wrapped = match self.peek() {
            Some(Token::Ident(keyword)) if keyword == "query" => {
                self.pos += 1;
                // optional operation name
                if matches!(self.peek(), Some(Token::Ident(_))) {
                    self.pos += 1;
                }
                true
            }
            Some(Token::Open) => true,
            _ => false,
        };

        if !wrapped {
            return self.root();
        }

        self.expect(Token::Open, "expected `{`")?;
        let query = self.root()?;
        self.expect(Token::Close, "expected `}` after the root field")?;
        Ok(query)
    }

    fn root(&mut self) -> Result<Query, QueryError> {
        let name = match self.peek() {
            Some(Token::Ident(name)) => name.clone(),
            _ => return Err(self.error("expected a root field")),
        };
        let node_type = match name.strip_prefix("all") {
            Some(node_type) if !node_type.is_empty() => node_type.to_string(),
            _ => {
                return Err(self.error(format!(
                    "expected a root field of the form `all<Type>`, found `{}`",
                    name
                )))
            }
        };
        self.pos += 1;

        let selection = self.selection_set()?;
        Ok(Query {
            node_type,
            selection: unwrap_connection(selection),
        })
    }

    fn selection_set(&mut self) -> Result<Vec<Selection>, QueryError> {
        let open_offset = self.offset();
        self.expect(Token::Open, "expected `{`")?;

        let mut fields = Vec::new();
        loop {
            match self.next() {
                Some((Token::Close, _)) => break,
                Some((Token::Ident(name), _)) => {
                    let children = if self.peek() == Some(&Token::Open) {
                        self.selection_set()?
                    } else {
                        Vec::new()
                    };
                    fields.push(Selection { name, children });
                }
                Some((Token::Open, offset)) => {
                    return Err(QueryError::Syntax {
                        offset,
                        message: "expected a field name".to_string(),
                    })
                }
                None => return Err(self.error("unterminated selection set")),
            }
        }

        if fields.is_empty() {
            return Err(QueryError::Syntax {
                offset: open_offset,
                message: "empty selection set".to_string(),
            });
        }
        Ok(fields)
    }

    fn expect(&mut self, expected: Token, message: &str) -> Result<(), QueryError> {
        if self.peek() == Some(&expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(message))
        }
    }

    fn expect_end(&self) -> Result<(), QueryError> {
        if self.pos < self.tokens.len() {
            Err(self.error("unexpected input after the query"))
        } else {
            Ok(())
        }
    }
}

/// Strip `edges { node { .. } }` and `nodes { .. }` down to the node selection
fn unwrap_connection(mut selection: Vec<Selection>) -> Vec<Selection> {
    if let [only] = selection.as_mut_slice() {
        match only.name.as_str() {
            "nodes" if !only.children.is_empty() => return std::mem::take(&mut only.children),
            "edges" => {
                if let [node] = only.children.as_mut_slice() {
                    if node.name == "node" && !node.children.is_empty() {
                        return std::mem::take(&mut node.children);
                    }
                }
            }
            _ => {}
        }
    }
    selection
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nested(name: &str, children: &[&str]) -> Selection {
        Selection {
            name: name.to_string(),
            children: children.iter().map(|c| Selection::leaf(c)).collect(),
        }
    }

    #[test]
    fn test_parse_connection_query() {
        let query = parse_query(
            r#"
            query {
                allMdx {
                    edges {
                        node {
                            frontmatter { title }
                            fields { relativePath slug }
                        }
                    }
                }
            }
            "#,
        )
        .unwrap();

        assert_eq!(query.node_type, "Mdx");
        assert_eq!(
            query.selection,
            vec![
                nested("frontmatter", &["title"]),
                nested("fields", &["relativePath", "slug"]),
            ]
        );
    }

    #[test]
    fn test_short_forms_are_equivalent() {
        let long = parse_query("query Pages { allMdx { nodes { id, fields { slug } } } }").unwrap();
        let short = parse_query("allMdx { id fields { slug } }").unwrap();
        let anonymous = parse_query("{ allMdx { id fields { slug } } }").unwrap();
        assert_eq!(long, short);
        assert_eq!(short, anonymous);
    }

    #[test]
    fn test_comments_are_ignored() {
        let query = parse_query("allFile {\n  # where it lives\n  relativePath\n}").unwrap();
        assert_eq!(query.node_type, "File");
        assert_eq!(query.selection, vec![Selection::leaf("relativePath")]);
    }

    #[test]
    fn test_syntax_errors() {
        let err = parse_query("allMdx { fields { slug }").unwrap_err();
        assert!(matches!(err, QueryError::Syntax { .. }));

        let err = parse_query("mdx { id }").unwrap_err();
        assert_eq!(
            err,
            QueryError::Syntax {
                offset: 0,
                message: "expected a root field of the form `all<Type>`, found `mdx`".to_string()
            }
        );

        let err = parse_query("allMdx { }").unwrap_err();
        assert_eq!(
            err,
            QueryError::Syntax {
                offset: 7,
                message: "empty selection set".to_string()
            }
        );

        assert!(parse_query("allMdx { id } extra").is_err());
        assert!(parse_query("allMdx { fields.slug }").is_err());
    }
}
