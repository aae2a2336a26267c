// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Directed tensor connections between nodes.

use crate::NodeId;
use shape_algebra::TensorFact;

/// Index of an edge in its graph.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct EdgeId(pub usize);

impl EdgeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One tensor flowing from `source` into input slot `dest_slot` of `dest`.
///
/// Several edges may join the same pair of nodes (a layer consuming the
/// same tensor twice); they differ by id and slot.
#[derive(Debug, Clone)]
pub struct Edge {
    pub(crate) id: EdgeId,
    pub(crate) source: NodeId,
    pub(crate) dest: NodeId,
    pub(crate) dest_slot: usize,
    pub(crate) fact: TensorFact,
}

impl Edge {
    pub fn id(&self) -> EdgeId {
        self.id
    }

    pub fn source(&self) -> NodeId {
        self.source
    }

    pub fn dest(&self) -> NodeId {
        self.dest
    }

    pub fn dest_slot(&self) -> usize {
        self.dest_slot
    }

    /// The tensor carried; equal to the source node's output fact once
    /// the graph is built.
    pub fn fact(&self) -> &TensorFact {
        &self.fact
    }
}
