// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Orthogonal edge routing.
//!
//! An edge leaves the right side of its source and enters the left side of
//! its destination. Between adjacent ranks it bends once in the middle of
//! the rank gap. An edge skipping ranks climbs to a horizontal lane above
//! all columns, runs along it and drops into the gap before its
//! destination. Lanes are shared by edges whose gap ranges do not overlap.

use crate::record::{EdgeLayout, NodeLayout, Point};
use crate::LayoutConfig;
use model_graph::{Built, ModelGraph, NodeId};
use std::collections::BTreeMap;

/// Lane assignment of rank-skipping edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lanes {
    /// Lane of each edge, indexed by edge id; `None` for adjacent-rank edges.
    pub of_edge: Vec<Option<usize>>,
    pub count: usize,
}

impl Lanes {
    /// Vertical extent reserved above the columns.
    pub fn height(&self, config: &LayoutConfig) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            (self.count + 1) as f64 * config.lane_gap
        }
    }

    fn lane_y(lane: usize, config: &LayoutConfig) -> f64 {
        (lane + 1) as f64 * config.lane_gap
    }
}

/// Greedy interval colouring over rank gaps, in (first gap, last gap,
/// edge id) order.
pub fn assign_lanes(graph: &ModelGraph<Built>, ranks: &[usize]) -> Lanes {
    let mut spans: Vec<(usize, usize, usize)> = graph
        .edges()
        .filter_map(|e| {
            let (s, d) = (ranks[e.source().index()], ranks[e.dest().index()]);
            (d > s + 1).then_some((s, d - 1, e.id().index()))
        })
        .collect();
    spans.sort_unstable();

    let mut of_edge = vec![None; graph.edges().len()];
    let mut lane_ends: Vec<usize> = Vec::new();
    for (first_gap, last_gap, edge) in spans {
        let lane = match lane_ends.iter().position(|&end| end < first_gap) {
            Some(free) => {
                lane_ends[free] = last_gap;
                free
            }
            None => {
                lane_ends.push(last_gap);
                lane_ends.len() - 1
            }
        };
        of_edge[edge] = Some(lane);
    }
    Lanes {
        of_edge,
        count: lane_ends.len(),
    }
}

/// Left edge and width of every rank column.
#[derive(Debug, Clone, PartialEq)]
pub struct Columns {
    pub x: Vec<f64>,
    pub width: Vec<f64>,
    pub gap: f64,
}

impl Columns {
    fn gap_after(&self, rank: usize) -> f64 {
        self.x[rank] + self.width[rank] + self.gap / 2.0
    }

    fn gap_before(&self, rank: usize) -> f64 {
        self.x[rank] - self.gap / 2.0
    }
}

/// Waypoints of every edge, indexed by edge id.
pub fn route_edges(
    graph: &ModelGraph<Built>,
    nodes: &[NodeLayout],
    columns: &Columns,
    lanes: &Lanes,
    config: &LayoutConfig,
) -> Vec<EdgeLayout> {
    let fan = fan_offsets(graph, config.parallel_gap);

    graph
        .edges()
        .map(|edge| {
            let (src, dst) = (&nodes[edge.source().index()], &nodes[edge.dest().index()]);
            let offset = fan[edge.id().index()];
            let start = Point::new(src.x + src.width, src.y + src.height / 2.0 + offset);
            let end = Point::new(dst.x, dst.y + dst.height / 2.0 + offset);
            let exit_x = columns.gap_after(src.rank) + offset;

            let waypoints = match lanes.of_edge[edge.id().index()] {
                None => vec![
                    start,
                    Point::new(exit_x, start.y),
                    Point::new(exit_x, end.y),
                    end,
                ],
                Some(lane) => {
                    let lane_y = Lanes::lane_y(lane, config) + offset;
                    let enter_x = columns.gap_before(dst.rank) + offset;
                    vec![
                        start,
                        Point::new(exit_x, start.y),
                        Point::new(exit_x, lane_y),
                        Point::new(enter_x, lane_y),
                        Point::new(enter_x, end.y),
                        end,
                    ]
                }
            };

            EdgeLayout {
                edge: edge.id(),
                source: edge.source(),
                dest: edge.dest(),
                waypoints,
            }
        })
        .collect()
}

/// Offset of each edge within its bundle of parallel edges, centred on 0.
fn fan_offsets(graph: &ModelGraph<Built>, gap: f64) -> Vec<f64> {
    let mut bundles: BTreeMap<(NodeId, NodeId), Vec<usize>> = BTreeMap::new();
    for edge in graph.edges() {
        bundles
            .entry((edge.source(), edge.dest()))
            .or_default()
            .push(edge.id().index());
    }

    let mut offsets = vec![0.0; graph.edges().len()];
    for members in bundles.values() {
        let centre = (members.len() - 1) as f64 / 2.0;
        for (i, &edge) in members.iter().enumerate() {
            offsets[edge] = (i as f64 - centre) * gap;
        }
    }
    offsets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rank;
    use model_graph::{GraphBuilder, LayerRecord};

    fn build(records: &[LayerRecord]) -> ModelGraph<Built> {
        GraphBuilder::new().build_records("g", records).unwrap().graph
    }

    #[test]
    fn test_adjacent_edges_need_no_lane() {
        let g = build(&[
            LayerRecord::new("a", "input"),
            LayerRecord::new("b", "relu").with_inputs(["a"]),
        ]);
        let lanes = assign_lanes(&g, &rank::longest_path(&g));
        assert_eq!(lanes.count, 0);
        assert_eq!(lanes.height(&LayoutConfig::default()), 0.0);
    }

    #[test]
    fn test_disjoint_skips_share_a_lane() {
        // a -> b -> c -> d -> e, with skips a->c and c->e.
        let g = build(&[
            LayerRecord::new("a", "input"),
            LayerRecord::new("b", "relu").with_inputs(["a"]),
            LayerRecord::new("c", "add").with_inputs(["b", "a"]),
            LayerRecord::new("d", "relu").with_inputs(["c"]),
            LayerRecord::new("e", "add").with_inputs(["d", "c"]),
        ]);
        let lanes = assign_lanes(&g, &rank::longest_path(&g));
        assert_eq!(lanes.count, 1);
        assert_eq!(lanes.of_edge.iter().flatten().count(), 2);
    }

    #[test]
    fn test_overlapping_skips_get_separate_lanes() {
        let g = build(&[
            LayerRecord::new("a", "input"),
            LayerRecord::new("b", "relu").with_inputs(["a"]),
            LayerRecord::new("c", "relu").with_inputs(["b"]),
            LayerRecord::new("d", "add").with_inputs(["c", "a", "b"]),
        ]);
        let lanes = assign_lanes(&g, &rank::longest_path(&g));
        assert_eq!(lanes.count, 2);
    }

    #[test]
    fn test_parallel_edges_fan_out() {
        let g = build(&[
            LayerRecord::new("a", "input"),
            LayerRecord::new("sq", "multiply").with_inputs(["a", "a"]),
        ]);
        let offsets = fan_offsets(&g, 6.0);
        assert_eq!(offsets, vec![-3.0, 3.0]);
    }
}
