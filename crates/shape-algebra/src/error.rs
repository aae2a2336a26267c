// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for shape inference.

use crate::Shape;

/// Errors raised while inferring a node's output fact.
///
/// None of these abort a graph build: the builder records them as
/// warnings and marks the node's output as unknown.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShapeError {
    /// Input shapes cannot be combined by this operator.
    #[error("incompatible inputs for {op}: {detail}")]
    Incompatible { op: &'static str, detail: String },

    /// Two inputs disagree on one axis.
    #[error("{op} inputs disagree on axis {axis}: {lhs} vs {rhs}")]
    AxisMismatch {
        op: &'static str,
        axis: usize,
        lhs: Shape,
        rhs: Shape,
    },

    /// An attribute the operator needs is absent.
    #[error("{op} requires attribute '{attribute}'")]
    MissingAttribute {
        op: &'static str,
        attribute: &'static str,
    },

    /// An attribute is present but unusable.
    #[error("invalid attribute '{attribute}' for {op}: {detail}")]
    InvalidAttribute {
        op: &'static str,
        attribute: String,
        detail: String,
    },

    /// The operator received the wrong number of inputs.
    #[error("{op} expects {expected} input(s), got {actual}")]
    InputCount {
        op: &'static str,
        expected: &'static str,
        actual: usize,
    },

    /// No inference rule exists for this operator kind.
    #[error("unsupported operator '{kind}'")]
    Unsupported { kind: String },
}

impl ShapeError {
    /// Returns `true` for the unsupported-operator case.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, ShapeError::Unsupported { .. })
    }
}
