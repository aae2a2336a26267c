// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Layout properties over random acyclic graphs.

use graph_layout::{order, rank, LayoutConfig, LayoutEngine};
use model_graph::{Built, GraphBuilder, LayerRecord, ModelGraph};
use proptest::prelude::*;
use proptest::sample::Index;

/// Node `i` takes its inputs from earlier nodes picked by `parents[i]`.
fn dag(parents: &[Vec<Index>]) -> ModelGraph<Built> {
    let records: Vec<LayerRecord> = parents
        .iter()
        .enumerate()
        .map(|(i, picks)| {
            let name = format!("n{i}");
            if i == 0 || picks.is_empty() {
                return LayerRecord::new(name, "input").with_input_shape(vec![1usize, 8]);
            }
            let inputs: Vec<String> = picks.iter().map(|p| format!("n{}", p.index(i))).collect();
            let kind = if inputs.len() == 1 { "relu" } else { "add" };
            LayerRecord::new(name, kind).with_inputs(inputs)
        })
        .collect();
    GraphBuilder::new()
        .build_records("random", &records)
        .expect("generated graphs are acyclic with unique names")
        .graph
}

fn parents() -> impl Strategy<Value = Vec<Vec<Index>>> {
    prop::collection::vec(prop::collection::vec(any::<Index>(), 0..3), 1..24)
}

proptest! {
    #[test]
    fn prop_layout_is_deterministic(parents in parents()) {
        let graph = dag(&parents);
        let engine = LayoutEngine::new(LayoutConfig::default());
        prop_assert_eq!(engine.compute(&graph), engine.compute(&graph));
    }

    #[test]
    fn prop_layout_covers_graph(parents in parents()) {
        let graph = dag(&parents);
        let record = LayoutEngine::default().compute(&graph);
        prop_assert!(record.validate(&graph).is_ok());
        for edge in graph.edges() {
            prop_assert!(record.node(edge.source()).rank < record.node(edge.dest()).rank);
        }
    }

    #[test]
    fn prop_ordering_never_worse_than_declared(parents in parents()) {
        let graph = dag(&parents);
        let ranks = rank::longest_path(&graph);
        let declared = rank::layers(&graph, &ranks);
        let before = order::count_crossings(&graph, &ranks, &declared);
        let after = order::reduce_crossings(&graph, &ranks, declared, 24);
        prop_assert!(after.crossings <= before);
        prop_assert_eq!(after.crossings, order::count_crossings(&graph, &ranks, &after.layers));
    }
}
