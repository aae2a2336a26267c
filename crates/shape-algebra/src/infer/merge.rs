// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Merges: concatenation and element-wise broadcasting.

use super::{common_dtype, known_shapes};
use crate::attr::lookup;
use crate::{Attributes, MergeMode, Shape, ShapeError, TensorFact};

/// Concatenation along `axis` (default 1, negative counts from the end).
///
/// The output sums the concatenation axis; every other axis must agree
/// across inputs, unknown dimensions matching anything.
pub fn concat(attrs: &Attributes, inputs: &[TensorFact]) -> Result<TensorFact, ShapeError> {
    const OP: &str = "concat";
    require_inputs(OP, inputs)?;
    let dtype = common_dtype(OP, inputs)?;
    let axis = match lookup(attrs, &["axis", "dim"]) {
        None => 1,
        Some((key, value)) => value.as_i64().ok_or_else(|| ShapeError::InvalidAttribute {
            op: OP,
            attribute: key.to_string(),
            detail: format!("expected an integer axis, got {value}"),
        })?,
    };
    let Some(shapes) = known_shapes(inputs) else {
        return Ok(TensorFact { shape: None, dtype });
    };
    let first = shapes[0];
    let axis = first
        .normalize_axis(axis)
        .ok_or_else(|| ShapeError::InvalidAttribute {
            op: OP,
            attribute: "axis".into(),
            detail: format!("axis {axis} out of range for {first}"),
        })?;

    let mut dims = first.dims().to_vec();
    for other in &shapes[1..] {
        if other.rank() != first.rank() {
            return Err(ShapeError::Incompatible {
                op: OP,
                detail: format!("rank mismatch: {first} vs {other}"),
            });
        }
        for (i, d) in other.dims().iter().enumerate() {
            if i == axis {
                dims[i] = dims[i].add(*d);
                continue;
            }
            dims[i] = dims[i].unify(*d).ok_or_else(|| ShapeError::AxisMismatch {
                op: OP,
                axis: i,
                lhs: first.clone(),
                rhs: (*other).clone(),
            })?;
        }
    }
    Ok(TensorFact {
        shape: Some(Shape::new(dims)),
        dtype,
    })
}

/// Element-wise add / multiply: numpy broadcasting across all inputs.
pub fn broadcast(mode: MergeMode, inputs: &[TensorFact]) -> Result<TensorFact, ShapeError> {
    let op = match mode {
        MergeMode::Multiply => "multiply",
        _ => "add",
    };
    require_inputs(op, inputs)?;
    let dtype = common_dtype(op, inputs)?;
    let Some(shapes) = known_shapes(inputs) else {
        return Ok(TensorFact { shape: None, dtype });
    };
    let mut out = shapes[0].clone();
    for other in &shapes[1..] {
        out = out
            .broadcast(other)
            .ok_or_else(|| ShapeError::Incompatible {
                op,
                detail: format!("{out} and {other} do not broadcast"),
            })?;
    }
    Ok(TensorFact {
        shape: Some(out),
        dtype,
    })
}

fn require_inputs(op: &'static str, inputs: &[TensorFact]) -> Result<(), ShapeError> {
    if inputs.is_empty() {
        return Err(ShapeError::InputCount {
            op,
            expected: "at least 1",
            actual: 0,
        });
    }
    Ok(())
}
