// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Structural diff between two built graphs.
//!
//! Nodes are matched by name through each graph's name index, so a diff
//! costs one lookup per node of either side. Nodes present on one side
//! only are reported as added or removed and never compared. For nodes
//! on both sides the report lists every differing attribute name, plus
//! these markers for structural changes:
//!
//! | Marker | Meaning |
//! |---|---|
//! | `@kind` | operator kind differs |
//! | `@inputs` | input node names (in slot order) differ |
//! | `@input_shapes` | declared input shape or incoming edge shapes differ |
//! | `@body` | a composite's nested graph differs |

use model_graph::{Built, ModelGraph, Node};
use shape_algebra::Shape;
use std::collections::{BTreeMap, BTreeSet};

pub const KIND: &str = "@kind";
pub const INPUTS: &str = "@inputs";
pub const INPUT_SHAPES: &str = "@input_shapes";
pub const BODY: &str = "@body";

/// Node names grouped by how they changed from the first graph to the
/// second.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct DiffReport {
    pub added: BTreeSet<String>,
    pub removed: BTreeSet<String>,
    /// Node name → names of what changed.
    pub changed: BTreeMap<String, BTreeSet<String>>,
    pub unchanged: BTreeSet<String>,
}

impl DiffReport {
    /// `true` when nothing was added, removed or changed.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} added, {} removed, {} changed, {} unchanged",
            self.added.len(),
            self.removed.len(),
            self.changed.len(),
            self.unchanged.len()
        )
    }
}

/// Compares `before` with `after`. Neither graph is modified.
pub fn diff(before: &ModelGraph<Built>, after: &ModelGraph<Built>) -> DiffReport {
    let mut report = DiffReport::default();

    for old in before.nodes() {
        match after.node_by_name(old.name()) {
            None => {
                report.removed.insert(old.name().to_string());
            }
            Some(new) => {
                let changes = compare(before, old, after, new);
                if changes.is_empty() {
                    report.unchanged.insert(old.name().to_string());
                } else {
                    report.changed.insert(old.name().to_string(), changes);
                }
            }
        }
    }
    report.added = after
        .nodes()
        .filter(|n| before.node_by_name(n.name()).is_none())
        .map(|n| n.name().to_string())
        .collect();

    tracing::debug!(
        "diff '{}' -> '{}': {}",
        before.name(),
        after.name(),
        report.summary()
    );
    report
}

fn compare(
    before: &ModelGraph<Built>,
    old: &Node,
    after: &ModelGraph<Built>,
    new: &Node,
) -> BTreeSet<String> {
    let (a, b) = (old.attributes(), new.attributes());
    let mut changes: BTreeSet<String> = a
        .iter()
        .filter(|(key, value)| b.get(*key) != Some(*value))
        .map(|(key, _)| key.clone())
        .collect();
    changes.extend(b.keys().filter(|key| !a.contains_key(*key)).cloned());

    if old.kind() != new.kind() {
        changes.insert(KIND.to_string());
    }
    if input_names(before, old) != input_names(after, new) {
        changes.insert(INPUTS.to_string());
    }
    if input_shapes(before, old) != input_shapes(after, new) {
        changes.insert(INPUT_SHAPES.to_string());
    }
    let body_changed = match (old.subgraph(), new.subgraph()) {
        (Some(x), Some(y)) => !diff(x, y).is_empty(),
        (None, None) => false,
        _ => true,
    };
    if body_changed {
        changes.insert(BODY.to_string());
    }
    changes
}

fn input_names<'g>(graph: &'g ModelGraph<Built>, node: &Node) -> Vec<&'g str> {
    node.inputs()
        .iter()
        .map(|&e| graph.node(graph.edge(e).source()).name())
        .collect()
}

/// Declared shape first, then the shapes on the incoming edges.
fn input_shapes(graph: &ModelGraph<Built>, node: &Node) -> Vec<Option<Shape>> {
    std::iter::once(node.declared_shape().cloned())
        .chain(node.inputs().iter().map(|&e| graph.edge(e).fact().shape.clone()))
        .collect()
}
