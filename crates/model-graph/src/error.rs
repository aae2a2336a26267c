// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error and warning types for model loading and graph construction.

use shape_algebra::ShapeError;

/// Fatal errors: the build produced no graph.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// Two records share a name.
    #[error("duplicate node name '{name}'")]
    DuplicateNodeName { name: String },

    /// A record lists an input that names no record.
    #[error("node '{node}' references unknown input '{missing}'")]
    DanglingReference { node: String, missing: String },

    /// The records do not form a DAG.
    #[error("graph contains a cycle through: {}", nodes.join(", "))]
    CyclicGraph { nodes: Vec<String> },

    /// A nested sub-graph failed to build.
    #[error("in composite '{node}': {source}")]
    Composite {
        node: String,
        source: Box<GraphError>,
    },

    /// A model file could not be read.
    #[error("failed to read model: {0}")]
    Io(#[from] std::io::Error),

    /// A model file is not valid JSON for its format.
    #[error("failed to parse model: {0}")]
    Json(#[from] serde_json::Error),

    /// The document parsed but is not a usable model description.
    #[error("invalid model description: {detail}")]
    InvalidManifest { detail: String },

    /// No adapter recognises the document.
    #[error("unsupported model format: {detail}")]
    UnsupportedFormat { detail: String },

    /// The SafeTensors weight file could not be read.
    #[error("failed to load SafeTensors: {0}")]
    SafeTensors(String),
}

impl GraphError {
    /// Unwraps nested [`GraphError::Composite`] layers to the failing error.
    pub fn root_cause(&self) -> &GraphError {
        match self {
            GraphError::Composite { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Non-fatal problems found while shaping a graph. The affected node's
/// output fact is unknown; the rest of the graph is still built.
///
/// Node names inside composites are qualified with the composite path
/// (`block/conv`).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildWarning {
    /// Shape inference rejected the node's inputs or attributes.
    #[error("cannot infer shape of '{node}': {error}")]
    ShapeInference { node: String, error: ShapeError },

    /// The node's kind has no inference rule.
    #[error("unsupported operator '{kind}' at '{node}'")]
    UnsupportedOperator { node: String, kind: String },

    /// A source node has neither a declared shape nor an inherited fact.
    #[error("no input shape declared for '{node}'")]
    MissingInputShape { node: String },
}

impl BuildWarning {
    /// The (qualified) name of the node the warning is about.
    pub fn node(&self) -> &str {
        match self {
            BuildWarning::ShapeInference { node, .. }
            | BuildWarning::UnsupportedOperator { node, .. }
            | BuildWarning::MissingInputShape { node } => node,
        }
    }
}
