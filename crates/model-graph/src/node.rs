// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Graph nodes.
//!
//! A [`Node`] is immutable once the builder hands the graph out. The only
//! exception is its layout [`Position`], a write-once cell filled by the
//! layout engine.

use crate::graph::{Built, ModelGraph};
use crate::EdgeId;
use shape_algebra::{Attributes, OpKind, Shape, TensorFact};
use std::sync::OnceLock;

/// Index of a node in its graph; ids follow declaration order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(pub usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Top-left corner of a node in layout coordinates.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A layer of the model.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) name: String,
    pub(crate) kind: OpKind,
    pub(crate) source_kind: String,
    pub(crate) attributes: Attributes,
    pub(crate) inputs: Vec<EdgeId>,
    pub(crate) outputs: Vec<EdgeId>,
    pub(crate) declared_shape: Option<Shape>,
    pub(crate) output_fact: TensorFact,
    pub(crate) subgraph: Option<Box<ModelGraph<Built>>>,
    pub(crate) recurrent: bool,
    pub(crate) component: usize,
    pub(crate) position: OnceLock<Position>,
}

impl Node {
    pub(crate) fn new(id: NodeId, name: String, kind: OpKind, source_kind: String) -> Self {
        Self {
            id,
            name,
            kind,
            source_kind,
            attributes: Attributes::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            declared_shape: None,
            output_fact: TensorFact::unknown(),
            subgraph: None,
            recurrent: false,
            component: 0,
            position: OnceLock::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> OpKind {
        self.kind
    }

    /// The kind tag as the adapter spelled it.
    pub fn source_kind(&self) -> &str {
        &self.source_kind
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Incoming edges, ordered by input slot.
    pub fn inputs(&self) -> &[EdgeId] {
        &self.inputs
    }

    /// Outgoing edges, in creation order.
    pub fn outputs(&self) -> &[EdgeId] {
        &self.outputs
    }

    /// The input shape the record declared, if any.
    pub fn declared_shape(&self) -> Option<&Shape> {
        self.declared_shape.as_ref()
    }

    pub fn output_fact(&self) -> &TensorFact {
        &self.output_fact
    }

    /// The nested body of a composite node.
    pub fn subgraph(&self) -> Option<&ModelGraph<Built>> {
        self.subgraph.as_deref()
    }

    /// `true` for a composite that declared itself as one of its inputs.
    pub fn is_recurrent(&self) -> bool {
        self.recurrent
    }

    /// Index of the weakly connected component holding this node.
    pub fn component(&self) -> usize {
        self.component
    }

    pub fn position(&self) -> Option<Position> {
        self.position.get().copied()
    }

    /// Records the node's layout position.
    ///
    /// Succeeds once; later calls leave the first position in place and
    /// return the rejected value.
    pub fn set_position(&self, position: Position) -> Result<(), Position> {
        self.position.set(position)
    }

    /// One-line description: name, kind and output fact.
    pub fn summary(&self) -> String {
        let kind = if self.source_kind.is_empty() || self.source_kind == self.kind.as_str() {
            self.kind.to_string()
        } else {
            format!("{} ({})", self.kind, self.source_kind)
        };
        let mut s = format!("{:<24} {:<28} → {}", self.name, kind, self.output_fact);
        if let Some(sub) = self.subgraph() {
            s.push_str(&format!("  [{} nested nodes]", sub.len()));
        }
        if self.recurrent {
            s.push_str("  ↺");
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_is_write_once() {
        let node = Node::new(NodeId(0), "a".into(), OpKind::Dense, "Dense".into());
        assert_eq!(node.position(), None);

        let first = Position { x: 1.0, y: 2.0 };
        assert!(node.set_position(first).is_ok());
        assert!(node.set_position(Position { x: 5.0, y: 5.0 }).is_err());
        assert_eq!(node.position(), Some(first));
    }

    #[test]
    fn test_summary_mentions_source_kind() {
        let node = Node::new(NodeId(0), "conv1".into(), OpKind::Convolution, "Conv2D".into());
        let s = node.summary();
        assert!(s.contains("conv1"));
        assert!(s.contains("convolution (Conv2D)"));
    }
}
