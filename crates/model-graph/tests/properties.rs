// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Build properties over generated record sequences.

use model_graph::{Built, GraphBuilder, GraphError, LayerRecord, ModelGraph};
use proptest::prelude::*;
use proptest::sample::Index;
use shape_algebra::TensorFact;

/// Node `i` reads from node `i - 1` plus extra earlier nodes.
fn chain_records(extra: &[Vec<Index>]) -> Vec<LayerRecord> {
    extra
        .iter()
        .enumerate()
        .map(|(i, picks)| {
            let name = format!("n{i}");
            if i == 0 {
                return LayerRecord::new(name, "input").with_input_shape(vec![1usize, 8]);
            }
            let mut inputs = vec![format!("n{}", i - 1)];
            inputs.extend(picks.iter().map(|p| format!("n{}", p.index(i))));
            let kind = if inputs.len() == 1 { "relu" } else { "add" };
            LayerRecord::new(name, kind).with_inputs(inputs)
        })
        .collect()
}

type Signature = (
    Vec<(String, String, Option<TensorFact>)>,
    Vec<(usize, usize, usize, TensorFact)>,
    Vec<String>,
);

fn signature(graph: &ModelGraph<Built>) -> Signature {
    let nodes = graph
        .nodes()
        .map(|n| (n.name().to_string(), n.kind().to_string(), Some(n.output_fact().clone())))
        .collect();
    let edges = graph
        .edges()
        .map(|e| (e.source().index(), e.dest().index(), e.dest_slot(), e.fact().clone()))
        .collect();
    let order = graph
        .topological_order()
        .iter()
        .map(|&id| graph.node(id).name().to_string())
        .collect();
    (nodes, edges, order)
}

fn extra() -> impl Strategy<Value = Vec<Vec<Index>>> {
    prop::collection::vec(prop::collection::vec(any::<Index>(), 0..3), 2..20)
}

proptest! {
    #[test]
    fn prop_build_is_deterministic(extra in extra()) {
        let records = chain_records(&extra);
        let a = GraphBuilder::new().build_records("g", &records).unwrap();
        let b = GraphBuilder::new().build_records("g", &records).unwrap();
        prop_assert_eq!(signature(&a.graph), signature(&b.graph));
        prop_assert_eq!(a.warnings, b.warnings);
    }

    #[test]
    fn prop_dangling_reference_fails(extra in extra(), at in any::<Index>()) {
        let mut records = chain_records(&extra);
        let victim = at.index(records.len() - 1) + 1;
        records[victim].inputs.push("ghost".to_string());
        let err = GraphBuilder::new().build_records("g", &records).unwrap_err();
        match err {
            GraphError::DanglingReference { node, missing } => {
                prop_assert_eq!(node, format!("n{victim}"));
                prop_assert_eq!(missing, "ghost");
            }
            other => prop_assert!(false, "unexpected error: {other}"),
        }
    }

    #[test]
    fn prop_true_cycle_fails(extra in extra()) {
        let mut records = chain_records(&extra);
        let last = format!("n{}", records.len() - 1);
        records[0] = LayerRecord::new("n0", "relu").with_inputs([last]);
        let err = GraphBuilder::new().build_records("g", &records).unwrap_err();
        match err {
            GraphError::CyclicGraph { nodes } => prop_assert!(nodes.contains(&"n0".to_string())),
            other => prop_assert!(false, "unexpected error: {other}"),
        }
    }
}
