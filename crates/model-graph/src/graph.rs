// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Model graph: nodes, edges and their topological structure.
//!
//! # Type-State Pattern
//!
//! ```text
//! ModelGraph<Linked>   nodes created, edges resolved by name, no shapes.
//!       │  builder: sort + infer
//!       ▼
//! ModelGraph<Built>    topologically sorted, every edge carries a fact.
//! ```
//!
//! Layout and query code only ever accept `&ModelGraph<Built>`, so an
//! unsorted or unshaped graph cannot reach them.

use crate::{Edge, EdgeId, GraphError, Node, NodeId};
use shape_algebra::{OpKind, TensorFact};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::marker::PhantomData;

// ── Type-state markers ─────────────────────────────────────────────

/// Marker: nodes and edges exist, nothing is sorted or shaped.
#[derive(Debug, Clone)]
pub struct Linked;

/// Marker: sorted and shaped; the graph is immutable from here on.
#[derive(Debug, Clone)]
pub struct Built;

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Linked {}
    impl Sealed for super::Built {}
}

/// Sealed trait for graph states.
pub trait GraphState: sealed::Sealed + fmt::Debug + Clone + Send + Sync {}
impl GraphState for Linked {}
impl GraphState for Built {}

// ── ModelGraph ─────────────────────────────────────────────────────

/// A directed graph of layers.
///
/// Nodes are stored in declaration order and addressed by [`NodeId`];
/// names are unique. Acyclic: recurrent constructs appear as a single
/// composite node.
#[derive(Debug, Clone)]
pub struct ModelGraph<S: GraphState = Built> {
    name: String,
    pub(crate) nodes: Vec<Node>,
    pub(crate) edges: Vec<Edge>,
    by_name: HashMap<String, NodeId>,
    topo: Vec<NodeId>,
    inputs: Vec<NodeId>,
    outputs: Vec<NodeId>,
    num_components: usize,
    _state: PhantomData<S>,
}

// ── Linked state ───────────────────────────────────────────────────

impl ModelGraph<Linked> {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
            by_name: HashMap::new(),
            topo: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            num_components: 0,
            _state: PhantomData,
        }
    }

    /// Appends a node; fails if the name is taken.
    pub(crate) fn add_node(&mut self, mut node: Node) -> Result<NodeId, GraphError> {
        if self.by_name.contains_key(&node.name) {
            return Err(GraphError::DuplicateNodeName { name: node.name });
        }
        let id = NodeId(self.nodes.len());
        node.id = id;
        self.by_name.insert(node.name.clone(), id);
        self.nodes.push(node);
        Ok(id)
    }

    /// Connects `source` to the next free input slot of `dest`.
    pub(crate) fn add_edge(&mut self, source: NodeId, dest: NodeId) -> EdgeId {
        let id = EdgeId(self.edges.len());
        let dest_slot = self.nodes[dest.0].inputs.len();
        self.edges.push(Edge {
            id,
            source,
            dest,
            dest_slot,
            fact: TensorFact::unknown(),
        });
        self.nodes[source.0].outputs.push(id);
        self.nodes[dest.0].inputs.push(id);
        id
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Kahn's algorithm; among ready nodes the earliest declared goes first.
    ///
    /// On a cycle, reports the nodes that lie on (or between) cycles, in
    /// declaration order.
    pub(crate) fn topological_order(&self) -> Result<Vec<NodeId>, GraphError> {
        let mut in_degree: Vec<usize> = self.nodes.iter().map(|n| n.inputs.len()).collect();
        let mut ready: BTreeSet<NodeId> = self
            .nodes
            .iter()
            .filter(|n| n.inputs.is_empty())
            .map(|n| n.id)
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(id) = ready.pop_first() {
            order.push(id);
            for &e in &self.nodes[id.0].outputs {
                let dest = self.edges[e.0].dest;
                in_degree[dest.0] -= 1;
                if in_degree[dest.0] == 0 {
                    ready.insert(dest);
                }
            }
        }

        if order.len() == self.nodes.len() {
            return Ok(order);
        }
        Err(GraphError::CyclicGraph {
            nodes: self.cycle_members(&in_degree),
        })
    }

    /// Strips the downstream tail from the nodes Kahn could not emit.
    fn cycle_members(&self, in_degree: &[usize]) -> Vec<String> {
        let mut left: Vec<bool> = in_degree.iter().map(|&d| d > 0).collect();
        let mut out_degree: Vec<usize> = self
            .nodes
            .iter()
            .map(|n| {
                n.outputs
                    .iter()
                    .filter(|e| left[self.edges[e.0].dest.0])
                    .count()
            })
            .collect();

        let mut sinks: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|n| left[n.id.0] && out_degree[n.id.0] == 0)
            .map(|n| n.id)
            .collect();
        while let Some(id) = sinks.pop() {
            left[id.0] = false;
            for &e in &self.nodes[id.0].inputs {
                let src = self.edges[e.0].source;
                if left[src.0] {
                    out_degree[src.0] -= 1;
                    if out_degree[src.0] == 0 {
                        sinks.push(src);
                    }
                }
            }
        }

        self.nodes
            .iter()
            .filter(|n| left[n.id.0])
            .map(|n| n.name.clone())
            .collect()
    }

    /// Seals the graph: stores the order, copies each node's output fact
    /// onto its outgoing edges and computes inputs, outputs and components.
    pub(crate) fn into_built(mut self, topo: Vec<NodeId>) -> ModelGraph<Built> {
        for edge in &mut self.edges {
            edge.fact = self.nodes[edge.source.0].output_fact.clone();
        }
        let inputs = self
            .nodes
            .iter()
            .filter(|n| n.inputs.is_empty())
            .map(|n| n.id)
            .collect();
        let outputs = self
            .nodes
            .iter()
            .filter(|n| n.outputs.is_empty())
            .map(|n| n.id)
            .collect();
        let num_components = self.label_components();

        ModelGraph {
            name: self.name,
            nodes: self.nodes,
            edges: self.edges,
            by_name: self.by_name,
            topo,
            inputs,
            outputs,
            num_components,
            _state: PhantomData,
        }
    }

    /// Weakly connected components, numbered by their first declared node.
    fn label_components(&mut self) -> usize {
        const UNSET: usize = usize::MAX;
        let mut label = vec![UNSET; self.nodes.len()];
        let mut next = 0;
        for start in 0..self.nodes.len() {
            if label[start] != UNSET {
                continue;
            }
            label[start] = next;
            let mut stack = vec![start];
            while let Some(i) = stack.pop() {
                let node = &self.nodes[i];
                let neighbours = node
                    .inputs
                    .iter()
                    .map(|e| self.edges[e.0].source.0)
                    .chain(node.outputs.iter().map(|e| self.edges[e.0].dest.0));
                for j in neighbours {
                    if label[j] == UNSET {
                        label[j] = next;
                        stack.push(j);
                    }
                }
            }
            next += 1;
        }
        for (node, c) in self.nodes.iter_mut().zip(label) {
            node.component = c;
        }
        next
    }
}

// ── Built state ────────────────────────────────────────────────────

impl ModelGraph<Built> {
    /// Nodes in topological order (ties in declaration order).
    pub fn topological_order(&self) -> &[NodeId] {
        &self.topo
    }

    /// Nodes with no incoming edge, in declaration order.
    pub fn inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    /// Nodes with no outgoing edge, in declaration order.
    pub fn outputs(&self) -> &[NodeId] {
        &self.outputs
    }

    pub fn num_components(&self) -> usize {
        self.num_components
    }

    /// Input nodes of one connected component.
    pub fn component_inputs(&self, component: usize) -> impl Iterator<Item = &Node> + '_ {
        self.inputs
            .iter()
            .map(|&id| &self.nodes[id.0])
            .filter(move |n| n.component == component)
    }

    /// Node count including every nested sub-graph.
    pub fn total_nodes(&self) -> usize {
        self.nodes
            .iter()
            .map(|n| 1 + n.subgraph().map_or(0, |g| g.total_nodes()))
            .sum()
    }

    /// Number of nodes per kind, sorted by kind name.
    pub fn kind_histogram(&self) -> Vec<(OpKind, usize)> {
        let mut counts: HashMap<OpKind, usize> = HashMap::new();
        for node in &self.nodes {
            *counts.entry(node.kind).or_default() += 1;
        }
        let mut hist: Vec<_> = counts.into_iter().collect();
        hist.sort_by_key(|(k, _)| k.as_str());
        hist
    }

    /// Returns a summary string describing the model.
    pub fn summary(&self) -> String {
        let unknown = self
            .nodes
            .iter()
            .filter(|n| n.output_fact.is_unknown())
            .count();
        format!(
            "Model '{}': {} nodes ({} total with nested), {} edges, {} input(s), {} output(s), {} component(s), {} unshaped",
            self.name,
            self.len(),
            self.total_nodes(),
            self.edges.len(),
            self.inputs.len(),
            self.outputs.len(),
            self.num_components,
            unknown,
        )
    }
}

// ── Shared implementations ─────────────────────────────────────────

impl<S: GraphState> ModelGraph<S> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_by_name(&self, name: &str) -> Option<&Node> {
        self.by_name.get(name).map(|id| &self.nodes[id.0])
    }

    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    /// Nodes in declaration order.
    pub fn nodes(&self) -> impl ExactSizeIterator<Item = &Node> + '_ {
        self.nodes.iter()
    }

    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.0]
    }

    pub fn edges(&self) -> impl ExactSizeIterator<Item = &Edge> + '_ {
        self.edges.iter()
    }

    /// Incoming edges of `id`, in slot order.
    pub fn incoming(&self, id: NodeId) -> impl Iterator<Item = &Edge> + '_ {
        self.nodes[id.0].inputs.iter().map(|e| &self.edges[e.0])
    }

    pub fn outgoing(&self, id: NodeId) -> impl Iterator<Item = &Edge> + '_ {
        self.nodes[id.0].outputs.iter().map(|e| &self.edges[e.0])
    }

    /// Producers of `id`'s inputs, in slot order (repeats kept).
    pub fn predecessors(&self, id: NodeId) -> impl Iterator<Item = &Node> + '_ {
        self.incoming(id).map(|e| &self.nodes[e.source.0])
    }

    pub fn successors(&self, id: NodeId) -> impl Iterator<Item = &Node> + '_ {
        self.outgoing(id).map(|e| &self.nodes[e.dest.0])
    }
}

impl<S: GraphState> fmt::Display for ModelGraph<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ModelGraph '{}' ({} nodes):", self.name, self.nodes.len())?;
        for node in &self.nodes {
            writeln!(f, "  {}", node.summary())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linked(names: &[&str], edges: &[(usize, usize)]) -> ModelGraph<Linked> {
        let mut g = ModelGraph::new("t");
        for name in names {
            g.add_node(Node::new(NodeId(0), (*name).into(), OpKind::Dense, String::new()))
                .unwrap();
        }
        for &(a, b) in edges {
            g.add_edge(NodeId(a), NodeId(b));
        }
        g
    }

    fn names(g: &ModelGraph<Linked>, order: &[NodeId]) -> Vec<String> {
        order.iter().map(|id| g.node(*id).name.clone()).collect()
    }

    #[test]
    fn test_duplicate_name() {
        let mut g = linked(&["a"], &[]);
        let err = g
            .add_node(Node::new(NodeId(0), "a".into(), OpKind::Dense, String::new()))
            .unwrap_err();
        assert!(matches!(err, GraphError::DuplicateNodeName { name } if name == "a"));
    }

    #[test]
    fn test_topo_ties_follow_declaration() {
        // c and b are both ready after a; b was declared first.
        let g = linked(&["a", "b", "c", "d"], &[(0, 2), (0, 1), (1, 3), (2, 3)]);
        let order = g.topological_order().unwrap();
        assert_eq!(names(&g, &order), ["a", "b", "c", "d"]);
    }

    #[test]
    fn test_topo_records_out_of_order() {
        let g = linked(&["head", "x", "body"], &[(1, 2), (2, 0)]);
        let order = g.topological_order().unwrap();
        assert_eq!(names(&g, &order), ["x", "body", "head"]);
    }

    #[test]
    fn test_cycle_reports_members_only() {
        // x → a → b → a, b → tail
        let g = linked(&["x", "a", "b", "tail"], &[(0, 1), (1, 2), (2, 1), (2, 3)]);
        match g.topological_order().unwrap_err() {
            GraphError::CyclicGraph { nodes } => assert_eq!(nodes, ["a", "b"]),
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn test_parallel_edges_get_distinct_slots() {
        let g = linked(&["a", "b"], &[(0, 1), (0, 1)]);
        let slots: Vec<_> = g.incoming(NodeId(1)).map(|e| e.dest_slot).collect();
        assert_eq!(slots, [0, 1]);
        assert_eq!(g.predecessors(NodeId(1)).count(), 2);
    }

    #[test]
    fn test_components_and_io_sets() {
        let g = linked(&["a", "b", "x", "y"], &[(0, 1), (2, 3)]);
        let order = g.topological_order().unwrap();
        let built = g.into_built(order);
        assert_eq!(built.num_components(), 2);
        assert_eq!(built.inputs(), &[NodeId(0), NodeId(2)]);
        assert_eq!(built.outputs(), &[NodeId(1), NodeId(3)]);
        let second: Vec<_> = built.component_inputs(1).map(|n| n.name()).collect();
        assert_eq!(second, ["x"]);
    }

    #[test]
    fn test_summary_and_display() {
        let g = linked(&["a", "b"], &[(0, 1)]);
        let order = g.topological_order().unwrap();
        let built = g.into_built(order);
        assert!(built.summary().contains("2 nodes"));
        let text = built.to_string();
        assert!(text.contains("a") && text.contains("b"));
    }
}
