// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The layout record: the contract handed to a renderer.
//!
//! Node and edge entries are indexed like the graph they were computed
//! from, so `record.nodes[id.index()]` belongs to `graph.node(id)`.

use crate::LayoutError;
use model_graph::{Built, EdgeId, ModelGraph, NodeId, Position};
use std::collections::BTreeSet;

/// A point on an edge polyline.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Placement of one node. `(x, y)` is the top-left corner.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NodeLayout {
    pub id: NodeId,
    pub name: String,
    pub rank: usize,
    /// Position within the rank column, top to bottom.
    pub order: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// The size fell back to the configured minimum.
    pub estimated: bool,
    /// Layout of a composite's body, relative to its own origin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nested: Option<Box<LayoutRecord>>,
}

impl NodeLayout {
    pub fn position(&self) -> Position {
        Position { x: self.x, y: self.y }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Route of one edge, from the source's right side to the dest's left side.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EdgeLayout {
    pub edge: EdgeId,
    pub source: NodeId,
    pub dest: NodeId,
    pub waypoints: Vec<Point>,
}

/// Positions and routes for every node and edge of one graph.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LayoutRecord {
    pub graph: String,
    pub nodes: Vec<NodeLayout>,
    pub edges: Vec<EdgeLayout>,
    pub width: f64,
    pub height: f64,
    /// Adjacent-rank crossings of the chosen ordering.
    pub crossings: usize,
    /// Barycenter sweeps performed.
    pub passes: usize,
}

impl LayoutRecord {
    pub fn node(&self, id: NodeId) -> &NodeLayout {
        &self.nodes[id.index()]
    }

    pub fn node_by_name(&self, name: &str) -> Option<&NodeLayout> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn edge(&self, id: EdgeId) -> &EdgeLayout {
        &self.edges[id.index()]
    }

    /// Number of ranks (columns).
    pub fn num_ranks(&self) -> usize {
        self.nodes.iter().map(|n| n.rank + 1).max().unwrap_or(0)
    }

    /// Node ids of one rank, top to bottom.
    pub fn rank_members(&self, rank: usize) -> Vec<NodeId> {
        let mut members: Vec<&NodeLayout> = self.nodes.iter().filter(|n| n.rank == rank).collect();
        members.sort_by_key(|n| n.order);
        members.into_iter().map(|n| n.id).collect()
    }

    /// Pretty-printed JSON for renderers.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Checks that this record covers exactly the nodes and edges of
    /// `graph`, that ranks increase along every edge, and that orders are
    /// a permutation within each rank. Nested records are checked against
    /// their composite's body.
    pub fn validate(&self, graph: &ModelGraph<Built>) -> Result<(), LayoutError> {
        let mismatch = |detail: String| LayoutError::Mismatch {
            graph: graph.name().to_string(),
            detail,
        };

        if self.nodes.len() != graph.len() || self.edges.len() != graph.edges().len() {
            return Err(mismatch(format!(
                "record has {} node(s) and {} edge(s), graph has {} and {}",
                self.nodes.len(),
                self.edges.len(),
                graph.len(),
                graph.edges().len()
            )));
        }

        for node in graph.nodes() {
            let entry = self.node(node.id());
            if entry.id != node.id() || entry.name != node.name() {
                return Err(mismatch(format!(
                    "entry {} is '{}', expected '{}'",
                    node.id().index(),
                    entry.name,
                    node.name()
                )));
            }
            let finite = [entry.x, entry.y, entry.width, entry.height]
                .iter()
                .all(|v| v.is_finite());
            if !finite || entry.width <= 0.0 || entry.height <= 0.0 {
                return Err(mismatch(format!("node '{}' has no usable box", entry.name)));
            }
            match (node.subgraph(), &entry.nested) {
                (Some(sub), Some(nested)) => nested.validate(sub)?,
                (Some(sub), None) if sub.is_empty() => {}
                (Some(_), None) => {
                    return Err(mismatch(format!("composite '{}' has no nested layout", entry.name)))
                }
                (None, Some(_)) => {
                    return Err(mismatch(format!("node '{}' is not a composite", entry.name)))
                }
                (None, None) => {}
            }
        }

        for edge in graph.edges() {
            let entry = self.edge(edge.id());
            if entry.source != edge.source() || entry.dest != edge.dest() {
                return Err(mismatch(format!("edge {} has wrong endpoints", edge.id().index())));
            }
            if self.node(edge.source()).rank >= self.node(edge.dest()).rank {
                return Err(mismatch(format!(
                    "edge '{}' -> '{}' does not increase rank",
                    graph.node(edge.source()).name(),
                    graph.node(edge.dest()).name()
                )));
            }
            if entry.waypoints.len() < 2 {
                return Err(mismatch(format!("edge {} has no route", edge.id().index())));
            }
        }

        for rank in 0..self.num_ranks() {
            let orders: BTreeSet<usize> = self
                .nodes
                .iter()
                .filter(|n| n.rank == rank)
                .map(|n| n.order)
                .collect();
            let count = self.nodes.iter().filter(|n| n.rank == rank).count();
            if orders.len() != count || orders.iter().next_back().is_some_and(|&m| m + 1 != count) {
                return Err(mismatch(format!("orders in rank {rank} are not a permutation")));
            }
        }
        Ok(())
    }

    /// Writes every node position into `graph`, nested bodies included.
    ///
    /// Positions are write-once; returns how many nodes were pinned by this
    /// call. Nodes already pinned keep their first position.
    pub fn pin(&self, graph: &ModelGraph<Built>) -> usize {
        let mut pinned = 0;
        for entry in &self.nodes {
            if entry.id.index() >= graph.len() {
                continue;
            }
            let node = graph.node(entry.id);
            if node.name() != entry.name {
                tracing::warn!("skipping pin of '{}': graph holds '{}'", entry.name, node.name());
                continue;
            }
            if node.set_position(entry.position()).is_ok() {
                pinned += 1;
            }
            if let (Some(sub), Some(nested)) = (node.subgraph(), &entry.nested) {
                pinned += nested.pin(sub);
            }
        }
        pinned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LayoutConfig, LayoutEngine};
    use model_graph::{GraphBuilder, LayerRecord};

    fn chain() -> ModelGraph<Built> {
        let records = vec![
            LayerRecord::new("x", "input").with_input_shape(vec![1usize, 4]),
            LayerRecord::new("fc", "dense").with_inputs(["x"]).with_attr("units", 2usize),
            LayerRecord::new("act", "relu").with_inputs(["fc"]),
        ];
        GraphBuilder::new().build_records("chain", &records).unwrap().graph
    }

    #[test]
    fn test_validate_accepts_computed_layout() {
        let graph = chain();
        let record = LayoutEngine::new(LayoutConfig::default()).compute(&graph);
        record.validate(&graph).unwrap();
        assert_eq!(record.num_ranks(), 3);
        assert_eq!(record.rank_members(1), vec![graph.node_id("fc").unwrap()]);
    }

    #[test]
    fn test_validate_rejects_other_graph() {
        let graph = chain();
        let record = LayoutEngine::new(LayoutConfig::default()).compute(&graph);
        let other = GraphBuilder::new()
            .build_records("one", &[LayerRecord::new("x", "input")])
            .unwrap()
            .graph;
        assert!(matches!(record.validate(&other), Err(LayoutError::Mismatch { .. })));
    }

    #[test]
    fn test_validate_rejects_duplicate_order() {
        let graph = chain();
        let mut record = LayoutEngine::new(LayoutConfig::default()).compute(&graph);
        record.nodes[1].rank = 0;
        assert!(record.validate(&graph).is_err());
    }

    #[test]
    fn test_pin_is_write_once() {
        let graph = chain();
        let record = LayoutEngine::new(LayoutConfig::default()).compute(&graph);
        assert_eq!(record.pin(&graph), 3);
        assert_eq!(record.pin(&graph), 0);
        let fc = graph.node_by_name("fc").unwrap();
        assert_eq!(fc.position(), Some(record.node(fc.id()).position()));
    }

    #[test]
    fn test_to_json_contract() {
        let graph = chain();
        let record = LayoutEngine::new(LayoutConfig::default()).compute(&graph);
        let value: serde_json::Value = serde_json::from_str(&record.to_json().unwrap()).unwrap();
        assert_eq!(value["graph"], "chain");
        assert_eq!(value["nodes"][1]["name"], "fc");
        assert_eq!(value["nodes"][1]["rank"], 1);
        assert!(value["nodes"][1].get("nested").is_none());
        assert_eq!(value["edges"][0]["source"], 0);
        assert!(value["edges"][0]["waypoints"].as_array().unwrap().len() >= 2);
    }
}
