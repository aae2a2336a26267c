// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Rank assignment.

use model_graph::{Built, ModelGraph};

/// Longest-path rank of every node, indexed by node id.
///
/// Sources sit at rank 0; every other node one past its deepest
/// predecessor, so each edge points to a strictly higher rank.
pub fn longest_path(graph: &ModelGraph<Built>) -> Vec<usize> {
    let mut ranks = vec![0usize; graph.len()];
    for &id in graph.topological_order() {
        let rank = ranks[id.index()];
        for edge in graph.outgoing(id) {
            let dest = edge.dest().index();
            ranks[dest] = ranks[dest].max(rank + 1);
        }
    }
    ranks
}

/// Node ids grouped by rank, in declaration order within each rank.
pub fn layers(graph: &ModelGraph<Built>, ranks: &[usize]) -> Vec<Vec<model_graph::NodeId>> {
    let depth = ranks.iter().map(|r| r + 1).max().unwrap_or(0);
    let mut layers = vec![Vec::new(); depth];
    for node in graph.nodes() {
        layers[ranks[node.id().index()]].push(node.id());
    }
    layers
}

#[cfg(test)]
mod tests {
    use super::*;
    use model_graph::{GraphBuilder, LayerRecord};

    fn build(records: &[LayerRecord]) -> ModelGraph<Built> {
        GraphBuilder::new().build_records("g", records).unwrap().graph
    }

    #[test]
    fn test_chain_ranks() {
        let g = build(&[
            LayerRecord::new("a", "input"),
            LayerRecord::new("b", "relu").with_inputs(["a"]),
            LayerRecord::new("c", "relu").with_inputs(["b"]),
        ]);
        assert_eq!(longest_path(&g), vec![0, 1, 2]);
    }

    #[test]
    fn test_skip_connection_takes_longest_path() {
        let g = build(&[
            LayerRecord::new("a", "input"),
            LayerRecord::new("b", "relu").with_inputs(["a"]),
            LayerRecord::new("c", "relu").with_inputs(["b"]),
            LayerRecord::new("sum", "add").with_inputs(["a", "c"]),
        ]);
        assert_eq!(longest_path(&g), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_layers_keep_declaration_order() {
        let g = build(&[
            LayerRecord::new("x", "input"),
            LayerRecord::new("y", "input"),
            LayerRecord::new("left", "relu").with_inputs(["y"]),
            LayerRecord::new("right", "relu").with_inputs(["x"]),
        ]);
        let ranks = longest_path(&g);
        let layers = layers(&g, &ranks);
        let names: Vec<Vec<&str>> = layers
            .iter()
            .map(|l| l.iter().map(|&id| g.node(id).name()).collect())
            .collect();
        assert_eq!(names, vec![vec!["x", "y"], vec!["left", "right"]]);
    }

    #[test]
    fn test_empty_graph() {
        let g = build(&[]);
        assert!(longest_path(&g).is_empty());
        assert!(layers(&g, &[]).is_empty());
    }
}
