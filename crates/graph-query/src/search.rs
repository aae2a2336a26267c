// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Node search.
//!
//! [`search`] pairs a graph with a predicate. Nothing is evaluated until
//! the result is iterated, and every call to [`Search::iter`] starts over
//! from the first node, so one search can be walked any number of times.
//!
//! [`NodeFilter`] is the textual predicate used by the CLI:
//!
//! ```text
//! conv                 name contains "conv"
//! name:block1_         same, explicit
//! kind:pooling         kind, kind family or source kind
//! attr:activation      attribute present
//! attr:filters=64      attribute equal to a value
//! kind:conv attr:strides=(2, 2)   all terms must match
//! ```

use crate::QueryError;
use model_graph::{Built, ModelGraph, Node, NodeId};
use shape_algebra::OpKind;
use std::fmt;
use std::str::FromStr;

/// A lazy, restartable search over one graph.
pub struct Search<'g, P> {
    graph: &'g ModelGraph<Built>,
    predicate: P,
}

/// Nodes of `graph` matching `predicate`, in declaration order.
///
/// # Example
/// ```no_run
/// use graph_query::search;
/// use model_graph::ModelLoader;
/// use shape_algebra::OpKind;
/// use std::path::Path;
///
/// let out = ModelLoader::build(Path::new("./model")).unwrap();
/// let convs = search(&out.graph, |n| n.kind() == OpKind::Convolution);
/// for name in convs.names() {
///     println!("{name}");
/// }
/// assert_eq!(convs.count(), convs.count());
/// ```
pub fn search<P>(graph: &ModelGraph<Built>, predicate: P) -> Search<'_, P>
where
    P: Fn(&Node) -> bool,
{
    Search { graph, predicate }
}

impl<'g, P> Search<'g, P>
where
    P: Fn(&Node) -> bool,
{
    /// A fresh pass over the matches.
    pub fn iter(&self) -> impl Iterator<Item = &'g Node> + '_ {
        let predicate = &self.predicate;
        self.graph.nodes().filter(move |node| predicate(node))
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.iter().map(Node::id)
    }

    pub fn names(&self) -> impl Iterator<Item = &'g str> + '_ {
        self.iter().map(Node::name)
    }

    pub fn count(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

/// One or more conditions on a node, all of which must hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeFilter {
    /// Case-insensitive substring of the node name.
    Name(String),
    /// Kind, kind family or adapter kind tag, case-insensitive.
    Kind(String),
    /// Attribute present, optionally with the given displayed value.
    Attr { key: String, value: Option<String> },
    All(Vec<NodeFilter>),
}

impl NodeFilter {
    pub fn matches(&self, node: &Node) -> bool {
        match self {
            NodeFilter::Name(needle) => node.name().to_lowercase().contains(needle.as_str()),
            NodeFilter::Kind(kind) => {
                let actual = node.kind();
                actual.family() == kind
                    || actual.as_str() == kind
                    || node.source_kind().eq_ignore_ascii_case(kind)
                    || OpKind::from_str_loose(kind) == Some(actual)
            }
            NodeFilter::Attr { key, value } => match (node.attributes().get(key), value) {
                (None, _) => false,
                (Some(_), None) => true,
                (Some(actual), Some(expected)) => actual.to_string() == *expected,
            },
            NodeFilter::All(filters) => filters.iter().all(|f| f.matches(node)),
        }
    }

    fn parse_term(term: &str) -> Result<Self, QueryError> {
        let invalid = |detail: &str| QueryError::InvalidFilter {
            term: term.to_string(),
            detail: detail.to_string(),
        };
        let Some((field, value)) = term.split_once(':') else {
            return Ok(NodeFilter::Name(term.to_lowercase()));
        };
        if value.is_empty() {
            return Err(invalid("missing value after ':'"));
        }
        match field {
            "name" => Ok(NodeFilter::Name(value.to_lowercase())),
            "kind" => Ok(NodeFilter::Kind(value.to_lowercase())),
            "attr" => match value.split_once('=') {
                Some(("", _)) => Err(invalid("missing attribute name")),
                Some((key, v)) => Ok(NodeFilter::Attr {
                    key: key.to_string(),
                    value: Some(v.to_string()),
                }),
                None => Ok(NodeFilter::Attr {
                    key: value.to_string(),
                    value: None,
                }),
            },
            _ => Err(invalid("expected name:, kind: or attr:")),
        }
    }
}

impl FromStr for NodeFilter {
    type Err = QueryError;

    /// Whitespace-separated terms; a parenthesised value may contain
    /// spaces (`attr:strides=(2, 2)`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut terms: Vec<String> = Vec::new();
        let mut depth = 0usize;
        let mut current = String::new();
        for c in s.trim().chars() {
            match c {
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                _ => {}
            }
            if c.is_whitespace() && depth == 0 {
                if !current.is_empty() {
                    terms.push(std::mem::take(&mut current));
                }
            } else {
                current.push(c);
            }
        }
        if !current.is_empty() {
            terms.push(current);
        }

        let mut filters = terms
            .iter()
            .map(|t| Self::parse_term(t))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(match filters.len() {
            1 => filters.remove(0),
            _ => NodeFilter::All(filters),
        })
    }
}

impl fmt::Display for NodeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeFilter::Name(n) => write!(f, "name:{n}"),
            NodeFilter::Kind(k) => write!(f, "kind:{k}"),
            NodeFilter::Attr { key, value: None } => write!(f, "attr:{key}"),
            NodeFilter::Attr { key, value: Some(v) } => write!(f, "attr:{key}={v}"),
            NodeFilter::All(filters) => {
                for (i, filter) in filters.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{filter}")?;
                }
                Ok(())
            }
        }
    }
}
