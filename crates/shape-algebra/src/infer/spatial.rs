// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Convolution and pooling: sliding windows over the spatial axes.

use super::{known_shapes, single_input};
use crate::attr::lookup;
use crate::{AttrValue, Attributes, Dim, PoolMode, Shape, ShapeError, TensorFact};

const KERNEL_KEYS: &[&str] = &["kernel_size", "kernel_shape", "kernel"];
const POOL_KERNEL_KEYS: &[&str] = &["pool_size", "kernel_size", "kernel_shape", "kernel"];
const STRIDE_KEYS: &[&str] = &["stride", "strides"];
const DILATION_KEYS: &[&str] = &["dilation", "dilations", "dilation_rate"];
const PADDING_KEYS: &[&str] = &["padding", "pads", "pad"];
const CHANNEL_KEYS: &[&str] = &["out_channels", "filters", "num_output", "channels"];
const LAYOUT_KEYS: &[&str] = &["data_format", "layout"];

/// Padding of a window operator, resolved per spatial axis.
#[derive(Debug, Clone, PartialEq)]
enum Padding {
    /// Total padding (both sides) per axis.
    Explicit(Vec<usize>),
    /// Output size is `ceil(in / stride)`.
    Same,
}

/// Window geometry shared by convolution and pooling.
#[derive(Debug)]
struct Window {
    kernel: Vec<usize>,
    stride: Vec<usize>,
    dilation: Vec<usize>,
    padding: Padding,
}

impl Window {
    fn output_dim(&self, op: &'static str, axis: usize, input: Dim) -> Result<Dim, ShapeError> {
        let stride = self.stride[axis];
        match &self.padding {
            Padding::Same => Ok(input.map(|n| n.div_ceil(stride))),
            Padding::Explicit(pads) => input.try_map(|n| {
                let overflow = || ShapeError::InvalidAttribute {
                    op,
                    attribute: "kernel_size".into(),
                    detail: format!("window arithmetic overflows on spatial axis {axis}"),
                };
                let field = self.dilation[axis]
                    .checked_mul(self.kernel[axis] - 1)
                    .and_then(|f| f.checked_add(1))
                    .ok_or_else(overflow)?;
                let padded = n.checked_add(pads[axis]).ok_or_else(overflow)?;
                if padded < field {
                    return Err(ShapeError::Incompatible {
                        op,
                        detail: format!(
                            "window of {field} exceeds padded input of {padded} on spatial axis {axis}"
                        ),
                    });
                }
                ((padded - field) / stride).checked_add(1).ok_or_else(overflow)
            }),
        }
    }
}

/// Convolution output: batch kept, channels from the declared output
/// channel count, spatial axes windowed.
pub fn convolution(attrs: &Attributes, inputs: &[TensorFact]) -> Result<TensorFact, ShapeError> {
    const OP: &str = "convolution";
    let input = single_input(OP, inputs)?;
    let out_channels = match lookup(attrs, CHANNEL_KEYS) {
        Some((_, value)) => value.as_usize().ok_or_else(|| ShapeError::InvalidAttribute {
            op: OP,
            attribute: "out_channels".into(),
            detail: format!("expected a non-negative integer, got {value}"),
        })?,
        None => {
            return Err(ShapeError::MissingAttribute {
                op: OP,
                attribute: "out_channels",
            })
        }
    };
    let channels_last = channels_last(OP, attrs)?;
    let Some(shape) = known_shapes(inputs).and_then(|s| s.first().copied()) else {
        return Ok(TensorFact {
            shape: None,
            dtype: input.dtype,
        });
    };
    let spatial = spatial_rank(OP, shape)?;
    let window = Window {
        kernel: spatial_list(OP, attrs, KERNEL_KEYS, "kernel_size", spatial, None)?,
        stride: spatial_list(OP, attrs, STRIDE_KEYS, "stride", spatial, Some(1))?,
        dilation: spatial_list(OP, attrs, DILATION_KEYS, "dilation", spatial, Some(1))?,
        padding: padding(OP, attrs, spatial)?,
    };
    let out = windowed(OP, shape, &window, channels_last, Dim::Known(out_channels))?;
    Ok(input.with_shape(out))
}

/// Pooling output: channels kept; global modes drop the spatial axes
/// (or keep them as 1 with `keepdims`).
pub fn pooling(
    mode: PoolMode,
    attrs: &Attributes,
    inputs: &[TensorFact],
) -> Result<TensorFact, ShapeError> {
    const OP: &str = "pooling";
    let input = single_input(OP, inputs)?;
    let channels_last = channels_last(OP, attrs)?;
    let Some(shape) = known_shapes(inputs).and_then(|s| s.first().copied()) else {
        return Ok(input.clone());
    };
    let spatial = spatial_rank(OP, shape)?;
    let channel_axis = if channels_last { shape.rank() - 1 } else { 1 };
    let channels = shape.dims()[channel_axis];

    if mode.is_global() {
        let keepdims = lookup(attrs, &["keepdims", "keep_dims"])
            .and_then(|(_, v)| v.as_bool())
            .unwrap_or(false);
        let out = if keepdims {
            let dims = shape
                .dims()
                .iter()
                .enumerate()
                .map(|(axis, d)| if axis == 0 || axis == channel_axis { *d } else { Dim::Known(1) })
                .collect();
            Shape::new(dims)
        } else {
            Shape::new(vec![shape.dims()[0], channels])
        };
        return Ok(input.with_shape(out));
    }

    let kernel = spatial_list(OP, attrs, POOL_KERNEL_KEYS, "pool_size", spatial, None)?;
    // Pooling strides default to the window, as in Keras and PyTorch.
    let stride = match lookup(attrs, STRIDE_KEYS) {
        Some(_) => spatial_list(OP, attrs, STRIDE_KEYS, "stride", spatial, None)?,
        None => kernel.clone(),
    };
    let window = Window {
        kernel,
        stride,
        dilation: spatial_list(OP, attrs, DILATION_KEYS, "dilation", spatial, Some(1))?,
        padding: padding(OP, attrs, spatial)?,
    };
    let out = windowed(OP, shape, &window, channels_last, channels)?;
    Ok(input.with_shape(out))
}

fn windowed(
    op: &'static str,
    shape: &Shape,
    window: &Window,
    channels_last: bool,
    channels: Dim,
) -> Result<Shape, ShapeError> {
    let dims = shape.dims();
    let spatial_axes = if channels_last {
        1..dims.len() - 1
    } else {
        2..dims.len()
    };
    let mut out = Vec::with_capacity(dims.len());
    out.push(dims[0]);
    if !channels_last {
        out.push(channels);
    }
    for (i, axis) in spatial_axes.enumerate() {
        out.push(window.output_dim(op, i, dims[axis])?);
    }
    if channels_last {
        out.push(channels);
    }
    Ok(Shape::new(out))
}

fn spatial_rank(op: &'static str, shape: &Shape) -> Result<usize, ShapeError> {
    if shape.rank() < 3 {
        return Err(ShapeError::Incompatible {
            op,
            detail: format!(
                "expected batch, channel and at least one spatial axis, got {shape}"
            ),
        });
    }
    Ok(shape.rank() - 2)
}

fn channels_last(op: &'static str, attrs: &Attributes) -> Result<bool, ShapeError> {
    let Some((key, value)) = lookup(attrs, LAYOUT_KEYS) else {
        return Ok(false);
    };
    match value.as_str().map(str::to_lowercase).as_deref() {
        Some("channels_last" | "nhwc" | "nwc" | "ndhwc") => Ok(true),
        Some("channels_first" | "nchw" | "ncw" | "ncdhw") => Ok(false),
        _ => Err(ShapeError::InvalidAttribute {
            op,
            attribute: key.to_string(),
            detail: format!("unknown data layout {value}"),
        }),
    }
}

/// Reads a per-spatial-axis list; a single value applies to every axis.
fn spatial_list(
    op: &'static str,
    attrs: &Attributes,
    keys: &[&str],
    name: &'static str,
    spatial: usize,
    default: Option<usize>,
) -> Result<Vec<usize>, ShapeError> {
    let Some((key, value)) = lookup(attrs, keys) else {
        return default
            .map(|d| vec![d; spatial])
            .ok_or(ShapeError::MissingAttribute { op, attribute: name });
    };
    let invalid = |detail: String| ShapeError::InvalidAttribute {
        op,
        attribute: key.to_string(),
        detail,
    };
    let list = value
        .as_usize_list()
        .ok_or_else(|| invalid(format!("expected integers, got {value}")))?;
    let list = match list.len() {
        1 => vec![list[0]; spatial],
        n if n == spatial => list,
        n => return Err(invalid(format!("{n} values for {spatial} spatial axes"))),
    };
    if list.contains(&0) {
        return Err(invalid("values must be positive".into()));
    }
    Ok(list)
}

fn padding(op: &'static str, attrs: &Attributes, spatial: usize) -> Result<Padding, ShapeError> {
    let Some((key, value)) = lookup(attrs, PADDING_KEYS) else {
        return Ok(Padding::Explicit(vec![0; spatial]));
    };
    let invalid = |detail: String| ShapeError::InvalidAttribute {
        op,
        attribute: key.to_string(),
        detail,
    };
    if let AttrValue::Str(mode) = value {
        return match mode.to_lowercase().as_str() {
            "same" | "same_upper" | "same_lower" => Ok(Padding::Same),
            "valid" => Ok(Padding::Explicit(vec![0; spatial])),
            other => Err(invalid(format!("unknown padding mode '{other}'"))),
        };
    }
    let list = value
        .as_usize_list()
        .ok_or_else(|| invalid(format!("expected integers, got {value}")))?;
    let totals: Option<Vec<usize>> = match list.len() {
        1 => list[0].checked_mul(2).map(|p| vec![p; spatial]),
        n if n == spatial => list.iter().map(|p| p.checked_mul(2)).collect(),
        // ONNX style: all begins, then all ends.
        n if n == 2 * spatial => (0..spatial)
            .map(|i| list[i].checked_add(list[i + spatial]))
            .collect(),
        n => return Err(invalid(format!("{n} values for {spatial} spatial axes"))),
    };
    totals
        .map(Padding::Explicit)
        .ok_or_else(|| invalid("padding overflows".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DType;

    fn attrs(pairs: &[(&str, AttrValue)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn nchw(dims: &[usize]) -> TensorFact {
        TensorFact::new(Shape::known(dims), DType::F32)
    }

    #[test]
    fn test_conv_same_size() {
        let a = attrs(&[
            ("kernel_size", 3i64.into()),
            ("stride", 1i64.into()),
            ("padding", 1i64.into()),
            ("out_channels", 8i64.into()),
        ]);
        let out = convolution(&a, &[nchw(&[1, 3, 32, 32])]).unwrap();
        assert_eq!(out.shape, Some(Shape::known(&[1, 8, 32, 32])));
    }

    #[test]
    fn test_conv_strided_floor() {
        let a = attrs(&[
            ("kernel_size", 3i64.into()),
            ("stride", 2i64.into()),
            ("out_channels", 4i64.into()),
        ]);
        // floor((32 - 3) / 2) + 1 = 15
        let out = convolution(&a, &[nchw(&[1, 3, 32, 32])]).unwrap();
        assert_eq!(out.shape, Some(Shape::known(&[1, 4, 15, 15])));
    }

    #[test]
    fn test_conv_dilation() {
        let a = attrs(&[
            ("kernel_size", 3i64.into()),
            ("dilation", 2i64.into()),
            ("out_channels", 4i64.into()),
        ]);
        // effective window 5: 16 - 5 + 1 = 12
        let out = convolution(&a, &[nchw(&[1, 3, 16, 16])]).unwrap();
        assert_eq!(out.shape, Some(Shape::known(&[1, 4, 12, 12])));
    }

    #[test]
    fn test_conv_keras_channels_last_same() {
        let a = attrs(&[
            ("kernel_size", vec![3i64, 3].into()),
            ("strides", vec![2i64, 2].into()),
            ("padding", "same".into()),
            ("filters", 32i64.into()),
            ("data_format", "channels_last".into()),
        ]);
        let input = TensorFact::new(
            Shape::new(vec![Dim::Unknown, Dim::Known(28), Dim::Known(28), Dim::Known(1)]),
            DType::F32,
        );
        let out = convolution(&a, &[input]).unwrap();
        assert_eq!(
            out.shape,
            Some(Shape::new(vec![
                Dim::Unknown,
                Dim::Known(14),
                Dim::Known(14),
                Dim::Known(32)
            ]))
        );
    }

    #[test]
    fn test_conv_onnx_pads() {
        let a = attrs(&[
            ("kernel_shape", vec![3i64, 3].into()),
            ("pads", vec![1i64, 0, 1, 0].into()),
            ("out_channels", 2i64.into()),
        ]);
        let out = convolution(&a, &[nchw(&[1, 1, 8, 8])]).unwrap();
        assert_eq!(out.shape, Some(Shape::known(&[1, 2, 8, 6])));
    }

    #[test]
    fn test_conv_window_too_large() {
        let a = attrs(&[("kernel_size", 5i64.into()), ("out_channels", 2i64.into())]);
        let err = convolution(&a, &[nchw(&[1, 1, 3, 3])]).unwrap_err();
        assert!(matches!(err, ShapeError::Incompatible { .. }));
    }

    #[test]
    fn test_conv_missing_channels() {
        let a = attrs(&[("kernel_size", 3i64.into())]);
        let err = convolution(&a, &[nchw(&[1, 1, 8, 8])]).unwrap_err();
        assert!(matches!(
            err,
            ShapeError::MissingAttribute { attribute: "out_channels", .. }
        ));
    }

    #[test]
    fn test_conv_rank_too_low() {
        let a = attrs(&[("kernel_size", 3i64.into()), ("out_channels", 2i64.into())]);
        assert!(convolution(&a, &[nchw(&[8, 8])]).is_err());
    }

    #[test]
    fn test_conv_zero_stride_rejected() {
        let a = attrs(&[
            ("kernel_size", 3i64.into()),
            ("stride", 0i64.into()),
            ("out_channels", 2i64.into()),
        ]);
        assert!(matches!(
            convolution(&a, &[nchw(&[1, 1, 8, 8])]),
            Err(ShapeError::InvalidAttribute { .. })
        ));
    }

    #[test]
    fn test_conv_huge_kernel_rejected() {
        let a = attrs(&[
            ("kernel_size", i64::MAX.into()),
            ("dilation", 4i64.into()),
            ("out_channels", 2i64.into()),
        ]);
        assert!(matches!(
            convolution(&a, &[nchw(&[1, 1, 8, 8])]),
            Err(ShapeError::InvalidAttribute { .. })
        ));
    }

    #[test]
    fn test_conv_huge_padding_rejected() {
        let a = attrs(&[
            ("kernel_size", 3i64.into()),
            ("padding", AttrValue::Float(1e30)),
            ("out_channels", 2i64.into()),
        ]);
        assert!(matches!(
            convolution(&a, &[nchw(&[1, 1, 8, 8])]),
            Err(ShapeError::InvalidAttribute { .. })
        ));
    }

    #[test]
    fn test_conv_kernel_arity_mismatch() {
        let a = attrs(&[
            ("kernel_size", vec![3i64, 3, 3].into()),
            ("out_channels", 2i64.into()),
        ]);
        assert!(matches!(
            convolution(&a, &[nchw(&[1, 1, 8, 8])]),
            Err(ShapeError::InvalidAttribute { .. })
        ));
    }

    #[test]
    fn test_max_pool_default_stride() {
        let a = attrs(&[("pool_size", 2i64.into())]);
        let out = pooling(PoolMode::Max, &a, &[nchw(&[1, 16, 32, 32])]).unwrap();
        assert_eq!(out.shape, Some(Shape::known(&[1, 16, 16, 16])));
    }

    #[test]
    fn test_avg_pool_explicit_stride() {
        let a = attrs(&[("kernel_size", 3i64.into()), ("stride", 1i64.into())]);
        let out = pooling(PoolMode::Average, &a, &[nchw(&[1, 4, 5, 5])]).unwrap();
        assert_eq!(out.shape, Some(Shape::known(&[1, 4, 3, 3])));
    }

    #[test]
    fn test_global_pool() {
        let out = pooling(PoolMode::GlobalAverage, &Attributes::new(), &[nchw(&[2, 64, 7, 7])])
            .unwrap();
        assert_eq!(out.shape, Some(Shape::known(&[2, 64])));

        let keep = attrs(&[("keepdims", true.into())]);
        let out = pooling(PoolMode::GlobalMax, &keep, &[nchw(&[2, 64, 7, 7])]).unwrap();
        assert_eq!(out.shape, Some(Shape::known(&[2, 64, 1, 1])));
    }

    #[test]
    fn test_global_pool_channels_last() {
        let a = attrs(&[("data_format", "channels_last".into())]);
        let out = pooling(PoolMode::GlobalAverage, &a, &[nchw(&[2, 7, 7, 64])]).unwrap();
        assert_eq!(out.shape, Some(Shape::known(&[2, 64])));
    }

    #[test]
    fn test_unknown_spatial_dim_propagates() {
        let a = attrs(&[("pool_size", 2i64.into())]);
        let input = TensorFact::new(
            Shape::new(vec![Dim::Known(1), Dim::Known(3), Dim::Unknown, Dim::Known(8)]),
            DType::F32,
        );
        let out = pooling(PoolMode::Max, &a, &[input]).unwrap();
        assert_eq!(
            out.shape,
            Some(Shape::new(vec![
                Dim::Known(1),
                Dim::Known(3),
                Dim::Unknown,
                Dim::Known(4)
            ]))
        );
    }
}
