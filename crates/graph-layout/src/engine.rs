// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The layered layout pipeline.
//!
//! ```text
//! composites ─► sizes ─► ranks ─► ordering ─► columns / rows ─► routes
//! ```
//!
//! Composite bodies are laid out first (in parallel when configured) so
//! that each composite can be placed as an opaque box of the nested size.

use crate::record::{LayoutRecord, NodeLayout};
use crate::route::{self, Columns};
use crate::size::{self, NodeSize};
use crate::{order, rank, LayoutConfig};
use model_graph::{Built, ModelGraph, NodeId};
use rayon::prelude::*;

/// Computes deterministic layered layouts.
///
/// # Example
/// ```no_run
/// use graph_layout::{LayoutConfig, LayoutEngine};
/// use model_graph::ModelLoader;
/// use std::path::Path;
///
/// let out = ModelLoader::build(Path::new("./models/tiny-cnn")).unwrap();
/// let record = LayoutEngine::new(LayoutConfig::default()).compute(&out.graph);
/// println!("{}", record.to_json().unwrap());
/// ```
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    config: LayoutConfig,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Lays out `graph`. Same graph and config, same record.
    pub fn compute(&self, graph: &ModelGraph<Built>) -> LayoutRecord {
        let config = &self.config;
        let mut nested = self.nested_layouts(graph);

        let sizes: Vec<NodeSize> = graph
            .nodes()
            .map(|node| match &nested[node.id().index()] {
                Some(record) => size::composite(node, record, config),
                None if node.subgraph().is_some() => NodeSize {
                    width: config.min_width,
                    height: config.min_height,
                    estimated: true,
                },
                None => size::estimate(node, config),
            })
            .collect();

        let ranks = rank::longest_path(graph);
        let ordering = order::reduce_crossings(
            graph,
            &ranks,
            rank::layers(graph, &ranks),
            config.max_passes,
        );
        let lanes = route::assign_lanes(graph, &ranks);

        // Columns: widest node per rank, separated by the rank gap.
        let widths: Vec<f64> = ordering
            .layers
            .iter()
            .map(|layer| {
                layer
                    .iter()
                    .map(|id| sizes[id.index()].width)
                    .fold(0.0, f64::max)
            })
            .collect();
        let mut column_x = Vec::with_capacity(widths.len());
        let mut x = 0.0;
        for width in &widths {
            column_x.push(x);
            x += width + config.rank_gap;
        }
        let total_width = (x - config.rank_gap).max(0.0);

        // Rows: stacked per column, columns centred on the tallest.
        let column_height = |layer: &Vec<NodeId>| {
            let boxes: f64 = layer.iter().map(|id| sizes[id.index()].height).sum();
            boxes + config.node_gap * layer.len().saturating_sub(1) as f64
        };
        let tallest = ordering.layers.iter().map(column_height).fold(0.0, f64::max);
        let top = lanes.height(config);

        let mut placed: Vec<Option<NodeLayout>> = vec![None; graph.len()];
        for (r, layer) in ordering.layers.iter().enumerate() {
            let mut y = top + (tallest - column_height(layer)) / 2.0;
            for (order, &id) in layer.iter().enumerate() {
                let node = graph.node(id);
                let size = sizes[id.index()];
                placed[id.index()] = Some(NodeLayout {
                    id,
                    name: node.name().to_string(),
                    rank: r,
                    order,
                    x: column_x[r] + (widths[r] - size.width) / 2.0,
                    y,
                    width: size.width,
                    height: size.height,
                    estimated: size.estimated,
                    nested: nested[id.index()].take().map(Box::new),
                });
                y += size.height + config.node_gap;
            }
        }
        let nodes: Vec<NodeLayout> = placed.into_iter().flatten().collect();

        let columns = Columns {
            x: column_x,
            width: widths,
            gap: config.rank_gap,
        };
        let edges = route::route_edges(graph, &nodes, &columns, &lanes, config);

        tracing::debug!(
            "laid out '{}': {} rank(s), {} crossing(s) after {} pass(es)",
            graph.name(),
            columns.x.len(),
            ordering.crossings,
            ordering.passes,
        );

        LayoutRecord {
            graph: graph.name().to_string(),
            nodes,
            edges,
            width: total_width,
            height: top + tallest,
            crossings: ordering.crossings,
            passes: ordering.passes,
        }
    }

    /// Nested records of composite bodies, indexed by node id. Empty
    /// bodies get no record.
    fn nested_layouts(&self, graph: &ModelGraph<Built>) -> Vec<Option<LayoutRecord>> {
        let bodies: Vec<(usize, &ModelGraph<Built>)> = graph
            .nodes()
            .filter_map(|n| n.subgraph().filter(|g| !g.is_empty()).map(|g| (n.id().index(), g)))
            .collect();

        let records: Vec<(usize, LayoutRecord)> = if self.config.parallel && bodies.len() > 1 {
            bodies
                .par_iter()
                .map(|(i, body)| (*i, self.compute(body)))
                .collect()
        } else {
            bodies.iter().map(|(i, body)| (*i, self.compute(body))).collect()
        };

        let mut nested = vec![None; graph.len()];
        for (i, record) in records {
            nested[i] = Some(record);
        }
        nested
    }
}
