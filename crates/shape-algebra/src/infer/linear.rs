// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Dense projections, flatten, and recurrent cells.

use super::single_input;
use crate::attr::lookup;
use crate::{Attributes, Dim, Shape, ShapeError, TensorFact};

const UNITS_KEYS: &[&str] = &["units", "out_features", "out_width", "output_width", "num_outputs"];

/// Replaces the last axis with the declared output width; leading
/// (batch, sequence) axes pass through.
pub fn dense(attrs: &Attributes, inputs: &[TensorFact]) -> Result<TensorFact, ShapeError> {
    const OP: &str = "dense";
    let input = single_input(OP, inputs)?;
    let units = units(OP, attrs)?.ok_or(ShapeError::MissingAttribute {
        op: OP,
        attribute: "units",
    })?;
    let Some(shape) = &input.shape else {
        return Ok(input.clone());
    };
    if shape.rank() == 0 {
        return Err(ShapeError::Incompatible {
            op: OP,
            detail: "cannot project a scalar".into(),
        });
    }
    let out = shape.with_dim(shape.rank() - 1, Dim::Known(units));
    Ok(input.with_shape(out))
}

/// Collapses every axis after the batch axis into one.
pub fn flatten(inputs: &[TensorFact]) -> Result<TensorFact, ShapeError> {
    const OP: &str = "flatten";
    let input = single_input(OP, inputs)?;
    let Some(shape) = &input.shape else {
        return Ok(input.clone());
    };
    let out = match shape.dims() {
        [] => {
            return Err(ShapeError::Incompatible {
                op: OP,
                detail: "cannot flatten a scalar".into(),
            })
        }
        [_] => shape.clone(),
        [batch, rest @ ..] => {
            let features = rest.iter().fold(Dim::Known(1), |acc, d| acc.mul(*d));
            Shape::new(vec![*batch, features])
        }
    };
    Ok(input.with_shape(out))
}

/// A recurrent cell with no expanded body (Keras `LSTM`, `GRU`).
///
/// `(N, T, F)` becomes `(N, T, units)` when `return_sequences` is set,
/// `(N, units)` otherwise. Without a `units` attribute the cell cannot be
/// shaped and is reported as unsupported.
pub fn recurrent(attrs: &Attributes, inputs: &[TensorFact]) -> Result<TensorFact, ShapeError> {
    const OP: &str = "recurrent";
    let Some(units) = units(OP, attrs)?.or(hidden_size(OP, attrs)?) else {
        return Err(ShapeError::Unsupported {
            kind: "composite".into(),
        });
    };
    let input = single_input(OP, inputs)?;
    let Some(shape) = &input.shape else {
        return Ok(input.clone());
    };
    let [batch, time, _features] = shape.dims() else {
        return Err(ShapeError::Incompatible {
            op: OP,
            detail: format!("expected (batch, time, features), got {shape}"),
        });
    };
    let sequences = lookup(attrs, &["return_sequences"])
        .and_then(|(_, v)| v.as_bool())
        .unwrap_or(false);
    let out = if sequences {
        Shape::new(vec![*batch, *time, Dim::Known(units)])
    } else {
        Shape::new(vec![*batch, Dim::Known(units)])
    };
    Ok(input.with_shape(out))
}

fn units(op: &'static str, attrs: &Attributes) -> Result<Option<usize>, ShapeError> {
    read_width(op, attrs, UNITS_KEYS)
}

fn hidden_size(op: &'static str, attrs: &Attributes) -> Result<Option<usize>, ShapeError> {
    read_width(op, attrs, &["hidden_size"])
}

fn read_width(
    op: &'static str,
    attrs: &Attributes,
    keys: &[&str],
) -> Result<Option<usize>, ShapeError> {
    match lookup(attrs, keys) {
        None => Ok(None),
        Some((key, value)) => match value.as_usize() {
            Some(0) | None => Err(ShapeError::InvalidAttribute {
                op,
                attribute: key.to_string(),
                detail: format!("expected a positive integer, got {value}"),
            }),
            Some(n) => Ok(Some(n)),
        },
    }
}
