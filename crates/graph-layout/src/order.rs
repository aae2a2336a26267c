// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Barycenter crossing reduction.
//!
//! Sweeps alternate downward (each rank ordered by its predecessors in the
//! rank before) and upward (by its successors in the rank after). A node
//! without neighbours in the fixed rank keeps its current ordinal as its
//! barycenter. The best ordering seen is kept, and the loop ends after
//! `max_passes` sweeps, at zero crossings, or once a full down/up round
//! brings no improvement.

use model_graph::{Built, ModelGraph, NodeId};
use std::cmp::Ordering as CmpOrdering;

/// Result of crossing reduction.
#[derive(Debug, Clone, PartialEq)]
pub struct Ordering {
    /// Node ids per rank, top to bottom.
    pub layers: Vec<Vec<NodeId>>,
    pub crossings: usize,
    pub passes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sweep {
    Down,
    Up,
}

/// Reorders `layers` (as produced by [`crate::rank::layers`]) to reduce
/// adjacent-rank edge crossings.
pub fn reduce_crossings(
    graph: &ModelGraph<Built>,
    ranks: &[usize],
    layers: Vec<Vec<NodeId>>,
    max_passes: usize,
) -> Ordering {
    let mut current = layers;
    let mut best = current.clone();
    let mut best_crossings = count_crossings(graph, ranks, &current);
    let mut passes = 0;
    let mut stale = 0;

    while passes < max_passes && best_crossings > 0 && stale < 2 {
        let sweep = if passes % 2 == 0 { Sweep::Down } else { Sweep::Up };
        sweep_layers(graph, ranks, &mut current, sweep);
        passes += 1;

        let crossings = count_crossings(graph, ranks, &current);
        tracing::debug!("pass {passes} ({sweep:?}): {crossings} crossing(s)");
        if crossings < best_crossings {
            best_crossings = crossings;
            best = current.clone();
            stale = 0;
        } else {
            stale += 1;
        }
    }

    Ordering {
        layers: best,
        crossings: best_crossings,
        passes,
    }
}

fn sweep_layers(graph: &ModelGraph<Built>, ranks: &[usize], layers: &mut [Vec<NodeId>], sweep: Sweep) {
    let depth = layers.len();
    let free: Vec<usize> = match sweep {
        Sweep::Down => (1..depth).collect(),
        Sweep::Up => (0..depth.saturating_sub(1)).rev().collect(),
    };

    for rank in free {
        let fixed = match sweep {
            Sweep::Down => rank - 1,
            Sweep::Up => rank + 1,
        };
        let fixed_pos = ordinals(graph.len(), &layers[fixed]);

        let mut keyed: Vec<(f64, usize, NodeId)> = layers[rank]
            .iter()
            .enumerate()
            .map(|(current, &id)| {
                let neighbours: Vec<usize> = match sweep {
                    Sweep::Down => graph.incoming(id).map(|e| e.source()).collect::<Vec<_>>(),
                    Sweep::Up => graph.outgoing(id).map(|e| e.dest()).collect::<Vec<_>>(),
                }
                .into_iter()
                .filter(|n| ranks[n.index()] == fixed)
                .filter_map(|n| fixed_pos[n.index()])
                .collect();
                let barycenter = if neighbours.is_empty() {
                    current as f64
                } else {
                    neighbours.iter().sum::<usize>() as f64 / neighbours.len() as f64
                };
                (barycenter, current, id)
            })
            .collect();

        keyed.sort_by(|a, b| {
            a.0.total_cmp(&b.0)
                .then(a.1.cmp(&b.1))
                .then(a.2.cmp(&b.2))
        });
        layers[rank] = keyed.into_iter().map(|(_, _, id)| id).collect();
    }
}

/// Ordinal of each node within `layer`, indexed by node id.
fn ordinals(len: usize, layer: &[NodeId]) -> Vec<Option<usize>> {
    let mut pos = vec![None; len];
    for (i, id) in layer.iter().enumerate() {
        pos[id.index()] = Some(i);
    }
    pos
}

/// Number of pairwise crossings among edges joining adjacent ranks.
///
/// Edges that skip ranks are routed in lanes and are not counted. Edges
/// sharing an endpoint never cross.
pub fn count_crossings(graph: &ModelGraph<Built>, ranks: &[usize], layers: &[Vec<NodeId>]) -> usize {
    let mut pos = vec![0usize; graph.len()];
    for layer in layers {
        for (i, id) in layer.iter().enumerate() {
            pos[id.index()] = i;
        }
    }

    let mut per_rank: Vec<Vec<(usize, usize)>> = vec![Vec::new(); layers.len()];
    for edge in graph.edges() {
        let (s, d) = (edge.source().index(), edge.dest().index());
        if ranks[d] == ranks[s] + 1 {
            per_rank[ranks[s]].push((pos[s], pos[d]));
        }
    }

    per_rank
        .iter()
        .map(|segments| {
            let mut crossings = 0;
            for (i, a) in segments.iter().enumerate() {
                for b in &segments[i + 1..] {
                    let crossed = matches!(
                        (a.0.cmp(&b.0), a.1.cmp(&b.1)),
                        (CmpOrdering::Less, CmpOrdering::Greater)
                            | (CmpOrdering::Greater, CmpOrdering::Less)
                    );
                    if crossed {
                        crossings += 1;
                    }
                }
            }
            crossings
        })
        .sum()
}
