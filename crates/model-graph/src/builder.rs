// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Graph construction from adapter records.
//!
//! Stages, each consuming the previous one's result:
//!
//! 1. one node per record (duplicate names are fatal);
//! 2. edges resolved by name (dangling references are fatal);
//! 3. Kahn topological sort (cycles are fatal);
//! 4. shape inference in topological order (failures become warnings);
//! 5. input, output and component sets.
//!
//! Nothing here performs I/O. Either a whole graph is returned or an
//! error; there is no partial result.

use crate::graph::{Built, Linked, ModelGraph};
use crate::{BuildWarning, GraphError, LayerRecord, ModelRecords, Node, NodeId};
use shape_algebra::{infer, DType, OpKind, TensorFact};

/// A built graph together with everything that went wrong while shaping it.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub graph: ModelGraph<Built>,
    pub warnings: Vec<BuildWarning>,
}

/// Turns [`LayerRecord`]s into a [`ModelGraph<Built>`].
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    default_dtype: DType,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self {
            default_dtype: DType::F32,
        }
    }
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Element type of declared input shapes that carry no `dtype` attribute.
    pub fn with_default_dtype(mut self, dtype: DType) -> Self {
        self.default_dtype = dtype;
        self
    }

    /// Builds a whole model.
    pub fn build(&self, model: &ModelRecords) -> Result<BuildOutput, GraphError> {
        self.build_records(&model.name, &model.records)
    }

    /// Builds a graph named `name` from `records`.
    pub fn build_records(
        &self,
        name: &str,
        records: &[LayerRecord],
    ) -> Result<BuildOutput, GraphError> {
        let mut warnings = Vec::new();
        let graph = self.build_scope(name, records, &[], "", &mut warnings)?;
        for warning in &warnings {
            tracing::warn!("{warning}");
        }
        tracing::debug!("{}", graph.summary());
        Ok(BuildOutput { graph, warnings })
    }

    /// Builds one (sub-)graph. `inherited` feeds the source nodes of a
    /// composite body; `path` prefixes node names in warnings.
    fn build_scope(
        &self,
        name: &str,
        records: &[LayerRecord],
        inherited: &[TensorFact],
        path: &str,
        warnings: &mut Vec<BuildWarning>,
    ) -> Result<ModelGraph<Built>, GraphError> {
        let mut graph = link(name, records)?;
        let order = graph.topological_order()?;

        let mut source_index = 0;
        for &id in &order {
            let record = &records[id.index()];
            let in_facts: Vec<TensorFact> = graph
                .incoming(id)
                .map(|e| graph.node(e.source()).output_fact().clone())
                .collect();

            let in_facts = if in_facts.is_empty() {
                let fed = self.source_fact(record, inherited.get(source_index));
                source_index += 1;
                match fed {
                    Some(fact) => vec![fact],
                    // A composite body may declare its own input shapes.
                    None if !record.children.is_empty() => Vec::new(),
                    None => {
                        warnings.push(BuildWarning::MissingInputShape {
                            node: format!("{path}{}", record.name),
                        });
                        continue;
                    }
                }
            } else {
                in_facts
            };

            let kind = graph.node(id).kind();
            let fact = if !record.children.is_empty() {
                let scope = format!("{path}{}/", record.name);
                let sub = self
                    .build_scope(&record.name, &record.children, &in_facts, &scope, warnings)
                    .map_err(|e| GraphError::Composite {
                        node: record.name.clone(),
                        source: Box::new(e),
                    })?;
                let fact = sub
                    .outputs()
                    .first()
                    .map(|&out| sub.node(out).output_fact().clone())
                    .unwrap_or_else(TensorFact::unknown);
                graph.node_mut(id).subgraph = Some(Box::new(sub));
                fact
            } else {
                match infer(kind, &record.attributes, &in_facts) {
                    Ok(fact) => fact,
                    Err(e) if e.is_unsupported() => {
                        warnings.push(BuildWarning::UnsupportedOperator {
                            node: format!("{path}{}", record.name),
                            kind: record.kind.clone(),
                        });
                        TensorFact::unknown()
                    }
                    Err(error) => {
                        warnings.push(BuildWarning::ShapeInference {
                            node: format!("{path}{}", record.name),
                            error,
                        });
                        TensorFact::unknown()
                    }
                }
            };
            graph.node_mut(id).output_fact = fact;
        }

        Ok(graph.into_built(order))
    }

    /// The fact entering a node that has no producer: its declared shape,
    /// else the fact inherited from the enclosing composite.
    fn source_fact(&self, record: &LayerRecord, inherited: Option<&TensorFact>) -> Option<TensorFact> {
        match &record.declared_input_shape {
            Some(shape) => {
                let dtype = record
                    .attributes
                    .get("dtype")
                    .and_then(|v| v.as_str())
                    .and_then(DType::from_str_loose)
                    .unwrap_or(self.default_dtype);
                Some(TensorFact::new(shape.clone(), dtype))
            }
            None => inherited.cloned(),
        }
    }
}

/// Stages 1 and 2: nodes, then edges resolved by name.
///
/// A composite listing itself as an input is a recurrent feedback loop;
/// the self-edge is dropped and the node flagged instead.
fn link(name: &str, records: &[LayerRecord]) -> Result<ModelGraph<Linked>, GraphError> {
    let mut graph = ModelGraph::new(name);
    for record in records {
        let kind = OpKind::from_str_loose(&record.kind).unwrap_or(OpKind::Unknown);
        let mut node = Node::new(NodeId(0), record.name.clone(), kind, record.kind.clone());
        node.attributes = record.attributes.clone();
        node.declared_shape = record.declared_input_shape.clone();
        graph.add_node(node)?;
    }

    for (i, record) in records.iter().enumerate() {
        let dest = NodeId(i);
        for input in &record.inputs {
            if *input == record.name && graph.node(dest).kind() == OpKind::Composite {
                graph.node_mut(dest).recurrent = true;
                continue;
            }
            let source = graph
                .node_id(input)
                .ok_or_else(|| GraphError::DanglingReference {
                    node: record.name.clone(),
                    missing: input.clone(),
                })?;
            graph.add_edge(source, dest);
        }
    }
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shape_algebra::{Dim, Shape, ShapeError};

    fn conv_chain() -> Vec<LayerRecord> {
        vec![
            LayerRecord::new("x", "input").with_input_shape(vec![1usize, 3, 32, 32]),
            LayerRecord::new("conv1", "conv2d")
                .with_inputs(["x"])
                .with_attr("kernel_size", 3i64)
                .with_attr("padding", 1i64)
                .with_attr("out_channels", 8i64),
            LayerRecord::new("relu1", "relu").with_inputs(["conv1"]),
        ]
    }

    #[test]
    fn test_build_three_node_chain() {
        let out = GraphBuilder::new().build_records("m", &conv_chain()).unwrap();
        assert!(out.warnings.is_empty());
        let g = &out.graph;
        assert_eq!(g.len(), 3);

        let conv = g.node_by_name("conv1").unwrap();
        let edge = g.outgoing(conv.id()).next().unwrap();
        assert_eq!(edge.fact().shape, Some(Shape::known(&[1, 8, 32, 32])));
        assert_eq!(edge.fact().dtype, Some(DType::F32));
        assert_eq!(g.inputs(), &[NodeId(0)]);
        assert_eq!(g.outputs(), &[NodeId(2)]);
    }

    #[test]
    fn test_records_in_any_order() {
        let mut records = conv_chain();
        records.reverse();
        let out = GraphBuilder::new().build_records("m", &records).unwrap();
        let names: Vec<_> = out
            .graph
            .topological_order()
            .iter()
            .map(|id| out.graph.node(*id).name())
            .collect();
        assert_eq!(names, ["x", "conv1", "relu1"]);
    }

    #[test]
    fn test_dangling_reference() {
        let records = vec![LayerRecord::new("a", "relu").with_inputs(["ghost"])];
        match GraphBuilder::new().build_records("m", &records).unwrap_err() {
            GraphError::DanglingReference { node, missing } => {
                assert_eq!(node, "a");
                assert_eq!(missing, "ghost");
            }
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn test_duplicate_name_fails() {
        let records = vec![LayerRecord::new("a", "input"), LayerRecord::new("a", "relu")];
        assert!(matches!(
            GraphBuilder::new().build_records("m", &records),
            Err(GraphError::DuplicateNodeName { .. })
        ));
    }

    #[test]
    fn test_cycle_fails() {
        let records = vec![
            LayerRecord::new("a", "relu").with_inputs(["b"]),
            LayerRecord::new("b", "relu").with_inputs(["a"]),
        ];
        assert!(matches!(
            GraphBuilder::new().build_records("m", &records),
            Err(GraphError::CyclicGraph { .. })
        ));
    }

    #[test]
    fn test_concat_mismatch_is_a_warning() {
        let records = vec![
            LayerRecord::new("a", "input").with_input_shape(vec![1usize, 16, 8, 8]),
            LayerRecord::new("b", "input").with_input_shape(vec![1usize, 32, 8, 4]),
            LayerRecord::new("cat", "concat").with_inputs(["a", "b"]),
            LayerRecord::new("after", "relu").with_inputs(["cat"]),
        ];
        let out = GraphBuilder::new().build_records("m", &records).unwrap();
        assert_eq!(out.warnings.len(), 1);
        assert!(matches!(
            &out.warnings[0],
            BuildWarning::ShapeInference {
                error: ShapeError::AxisMismatch { .. },
                ..
            }
        ));
        assert!(out.graph.node_by_name("cat").unwrap().output_fact().is_unknown());
        // Downstream of an unknown fact stays unknown without new warnings.
        assert!(out.graph.node_by_name("after").unwrap().output_fact().is_unknown());
    }

    #[test]
    fn test_unknown_kind_warns() {
        let records = vec![
            LayerRecord::new("x", "input").with_input_shape(vec![1usize, 4]),
            LayerRecord::new("e", "einsum").with_inputs(["x"]),
        ];
        let out = GraphBuilder::new().build_records("m", &records).unwrap();
        assert_eq!(
            out.warnings,
            [BuildWarning::UnsupportedOperator {
                node: "e".into(),
                kind: "einsum".into()
            }]
        );
        assert_eq!(out.graph.node_by_name("e").unwrap().kind(), OpKind::Unknown);
    }

    #[test]
    fn test_missing_input_shape_warns() {
        let records = vec![
            LayerRecord::new("x", "input"),
            LayerRecord::new("d", "dense").with_inputs(["x"]).with_attr("units", 4i64),
        ];
        let out = GraphBuilder::new().build_records("m", &records).unwrap();
        assert_eq!(
            out.warnings,
            [BuildWarning::MissingInputShape { node: "x".into() }]
        );
        let d = out.graph.node_by_name("d").unwrap();
        // Unknown rank flows through dense without a second warning.
        assert!(d.output_fact().is_unknown());
    }

    #[test]
    fn test_input_dtype_attribute() {
        let records = vec![LayerRecord::new("x", "input")
            .with_input_shape(vec![2usize, 2])
            .with_attr("dtype", "float16")];
        let out = GraphBuilder::new().build_records("m", &records).unwrap();
        assert_eq!(out.graph.node(NodeId(0)).output_fact().dtype, Some(DType::F16));
    }

    #[test]
    fn test_composite_inherits_facts() {
        let records = vec![
            LayerRecord::new("x", "input")
                .with_input_shape(Shape::new(vec![Dim::Unknown, Dim::Known(64)])),
            LayerRecord::new("block", "sequential")
                .with_inputs(["x"])
                .with_children(vec![
                    LayerRecord::new("fc", "dense").with_attr("units", 32i64),
                    LayerRecord::new("act", "relu").with_inputs(["fc"]),
                ]),
            LayerRecord::new("head", "dense").with_inputs(["block"]).with_attr("units", 10i64),
        ];
        let out = GraphBuilder::new().build_records("m", &records).unwrap();
        assert!(out.warnings.is_empty(), "{:?}", out.warnings);

        let block = out.graph.node_by_name("block").unwrap();
        let body = block.subgraph().unwrap();
        assert_eq!(body.len(), 2);
        assert_eq!(
            block.output_fact().shape,
            Some(Shape::new(vec![Dim::Unknown, Dim::Known(32)]))
        );
        assert_eq!(
            out.graph.node_by_name("head").unwrap().output_fact().shape,
            Some(Shape::new(vec![Dim::Unknown, Dim::Known(10)]))
        );
        assert_eq!(out.graph.total_nodes(), 5);
    }

    #[test]
    fn test_source_composite_builds_its_body() {
        let records = vec![LayerRecord::new("block", "composite").with_children(vec![
            LayerRecord::new("in", "input").with_input_shape(vec![1usize, 8]),
            LayerRecord::new("fc", "dense").with_inputs(["in"]).with_attr("units", 4i64),
        ])];
        let out = GraphBuilder::new().build_records("m", &records).unwrap();
        assert!(out.warnings.is_empty(), "{:?}", out.warnings);

        let block = out.graph.node_by_name("block").unwrap();
        assert_eq!(block.subgraph().unwrap().len(), 2);
        assert_eq!(block.output_fact().shape, Some(Shape::known(&[1, 4])));
    }

    #[test]
    fn test_source_composite_body_without_shape_warns_inside() {
        let records = vec![LayerRecord::new("block", "composite")
            .with_children(vec![LayerRecord::new("in", "input")])];
        let out = GraphBuilder::new().build_records("m", &records).unwrap();
        assert_eq!(
            out.warnings,
            [BuildWarning::MissingInputShape { node: "block/in".into() }]
        );
        assert!(out.graph.node_by_name("block").unwrap().subgraph().is_some());
    }

    #[test]
    fn test_declared_shape_is_kept() {
        let out = GraphBuilder::new().build_records("m", &conv_chain()).unwrap();
        let x = out.graph.node_by_name("x").unwrap();
        assert_eq!(x.declared_shape(), Some(&Shape::known(&[1, 3, 32, 32])));
        assert!(out.graph.node_by_name("conv1").unwrap().declared_shape().is_none());
    }

    #[test]
    fn test_composite_warnings_are_qualified() {
        let records = vec![
            LayerRecord::new("x", "input").with_input_shape(vec![1usize, 4]),
            LayerRecord::new("block", "block")
                .with_inputs(["x"])
                .with_children(vec![LayerRecord::new("odd", "einsum")]),
        ];
        let out = GraphBuilder::new().build_records("m", &records).unwrap();
        assert_eq!(out.warnings[0].node(), "block/odd");
    }

    #[test]
    fn test_composite_error_is_wrapped() {
        let records = vec![
            LayerRecord::new("x", "input").with_input_shape(vec![1usize, 4]),
            LayerRecord::new("block", "block")
                .with_inputs(["x"])
                .with_children(vec![LayerRecord::new("a", "relu").with_inputs(["nowhere"])]),
        ];
        let err = GraphBuilder::new().build_records("m", &records).unwrap_err();
        assert!(matches!(err, GraphError::Composite { ref node, .. } if node == "block"));
        assert!(matches!(err.root_cause(), GraphError::DanglingReference { .. }));
    }

    #[test]
    fn test_recurrent_self_input() {
        let records = vec![
            LayerRecord::new("x", "input")
                .with_input_shape(Shape::new(vec![Dim::Unknown, Dim::Known(20), Dim::Known(8)])),
            LayerRecord::new("lstm", "LSTM")
                .with_inputs(["x", "lstm"])
                .with_attr("units", 16i64),
        ];
        let out = GraphBuilder::new().build_records("m", &records).unwrap();
        let lstm = out.graph.node_by_name("lstm").unwrap();
        assert!(lstm.is_recurrent());
        assert_eq!(lstm.inputs().len(), 1);
        assert_eq!(
            lstm.output_fact().shape,
            Some(Shape::new(vec![Dim::Unknown, Dim::Known(16)]))
        );
    }

    #[test]
    fn test_disconnected_components() {
        let records = vec![
            LayerRecord::new("a", "input").with_input_shape(vec![1usize, 2]),
            LayerRecord::new("b", "input").with_input_shape(vec![1usize, 3]),
            LayerRecord::new("a_out", "relu").with_inputs(["a"]),
            LayerRecord::new("b_out", "relu").with_inputs(["b"]),
        ];
        let out = GraphBuilder::new().build_records("m", &records).unwrap();
        assert_eq!(out.graph.num_components(), 2);
        assert_eq!(out.graph.node_by_name("b_out").unwrap().component(), 1);
    }

    #[test]
    fn test_source_layer_with_declared_shape() {
        // Keras-style first layer carrying its own input shape.
        let records = vec![LayerRecord::new("fc", "Dense")
            .with_input_shape(Shape::new(vec![Dim::Unknown, Dim::Known(784)]))
            .with_attr("units", 128i64)];
        let out = GraphBuilder::new().build_records("m", &records).unwrap();
        assert_eq!(
            out.graph.node(NodeId(0)).output_fact().shape,
            Some(Shape::new(vec![Dim::Unknown, Dim::Known(128)]))
        );
    }
}
