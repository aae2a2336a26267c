// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Static shape inference.
//!
//! [`infer`] is a flat dispatch from [`OpKind`] to one rule per family:
//!
//! | Family | Rule |
//! |---|---|
//! | convolution, pooling | [`spatial`]: `floor((in + 2p − d(k−1) − 1)/s) + 1` |
//! | dense, flatten, recurrent | [`linear`] |
//! | concat, add, multiply | [`merge`] |
//! | activation, normalization, dropout, output | identity |
//!
//! Rules never panic on unknown data: an unknown dimension flows through
//! arithmetic as unknown, and an input of unknown rank makes the output
//! unknown without raising.

pub mod linear;
pub mod merge;
pub mod spatial;

use crate::{Attributes, DType, MergeMode, OpKind, Shape, ShapeError, TensorFact};

/// Infers the output fact of a node.
///
/// `inputs` are the facts of the node's incoming edges, in input-slot
/// order. Every supported operator has one output; all outgoing edges of
/// a node carry the same fact.
///
/// # Examples
/// ```
/// use shape_algebra::{infer, AttrValue, Attributes, DType, Dim, OpKind, Shape, TensorFact};
///
/// let mut attrs = Attributes::new();
/// attrs.insert("kernel_size".into(), AttrValue::Int(3));
/// attrs.insert("padding".into(), AttrValue::Int(1));
/// attrs.insert("out_channels".into(), AttrValue::Int(8));
///
/// let input = TensorFact::new(Shape::known(&[1, 3, 32, 32]), DType::F32);
/// let out = infer(OpKind::Convolution, &attrs, &[input]).unwrap();
/// assert_eq!(out.shape, Some(Shape::known(&[1, 8, 32, 32])));
/// ```
pub fn infer(
    kind: OpKind,
    attrs: &Attributes,
    inputs: &[TensorFact],
) -> Result<TensorFact, ShapeError> {
    match kind {
        OpKind::Input => {
            if inputs.is_empty() {
                Err(ShapeError::MissingAttribute {
                    op: "input",
                    attribute: "input_shape",
                })
            } else {
                identity("input", inputs)
            }
        }
        OpKind::Output => identity("output", inputs),
        OpKind::Activation => identity("activation", inputs),
        OpKind::Normalization => identity("normalization", inputs),
        OpKind::Dropout => identity("dropout", inputs),
        OpKind::Convolution => spatial::convolution(attrs, inputs),
        OpKind::Pooling(mode) => spatial::pooling(mode, attrs, inputs),
        OpKind::Dense => linear::dense(attrs, inputs),
        OpKind::Flatten => linear::flatten(inputs),
        OpKind::Composite => linear::recurrent(attrs, inputs),
        OpKind::Merge(MergeMode::Concat) => merge::concat(attrs, inputs),
        OpKind::Merge(mode) => merge::broadcast(mode, inputs),
        OpKind::Unknown => Err(ShapeError::Unsupported {
            kind: kind.as_str().to_string(),
        }),
    }
}

/// Shape-transparent operators.
fn identity(op: &'static str, inputs: &[TensorFact]) -> Result<TensorFact, ShapeError> {
    let input = single_input(op, inputs)?;
    Ok(input.clone())
}

/// Checks that exactly one input is present and returns it.
pub(crate) fn single_input<'a>(
    op: &'static str,
    inputs: &'a [TensorFact],
) -> Result<&'a TensorFact, ShapeError> {
    match inputs {
        [only] => Ok(only),
        _ => Err(ShapeError::InputCount {
            op,
            expected: "1",
            actual: inputs.len(),
        }),
    }
}

/// Collects input shapes, or `None` if any input has unknown rank.
pub(crate) fn known_shapes(inputs: &[TensorFact]) -> Option<Vec<&Shape>> {
    inputs.iter().map(|f| f.shape.as_ref()).collect()
}

/// The dtype shared by all inputs whose dtype is known.
///
/// Two different known dtypes are an error: merges do not promote.
pub(crate) fn common_dtype(
    op: &'static str,
    inputs: &[TensorFact],
) -> Result<Option<DType>, ShapeError> {
    let mut dtype: Option<DType> = None;
    for fact in inputs {
        match (dtype, fact.dtype) {
            (Some(a), Some(b)) if a != b => {
                return Err(ShapeError::Incompatible {
                    op,
                    detail: format!("mixed dtypes {a} and {b}"),
                });
            }
            (None, Some(b)) => dtype = Some(b),
            _ => {}
        }
    }
    Ok(dtype)
}
