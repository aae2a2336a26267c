// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tensor shape descriptors and dimension utilities.

use crate::{DType, Dim};
use std::fmt;

/// An ordered sequence of dimensions, some of which may be unknown.
///
/// Shapes are immutable once created and provide convenience methods for
/// element counts and broadcasting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Shape {
    dims: Vec<Dim>,
}

impl Shape {
    /// Creates a new shape from the given dimensions.
    ///
    /// # Examples
    /// ```
    /// use shape_algebra::{Dim, Shape};
    /// let s = Shape::new(vec![Dim::Unknown, Dim::Known(3), Dim::Known(32)]);
    /// assert_eq!(s.rank(), 3);
    /// assert_eq!(s.num_elements(), None);
    /// ```
    pub fn new(dims: Vec<Dim>) -> Self {
        Self { dims }
    }

    /// Creates a fully known shape.
    pub fn known(dims: &[usize]) -> Self {
        Self {
            dims: dims.iter().copied().map(Dim::Known).collect(),
        }
    }

    /// Creates a scalar shape (rank 0).
    pub fn scalar() -> Self {
        Self { dims: vec![] }
    }

    /// Returns the number of dimensions (rank).
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Returns the dimensions as a slice.
    pub fn dims(&self) -> &[Dim] {
        &self.dims
    }

    /// Returns a specific dimension, or `None` if out of bounds.
    pub fn dim(&self, index: usize) -> Option<Dim> {
        self.dims.get(index).copied()
    }

    /// Returns `true` when every dimension is known.
    pub fn is_fully_known(&self) -> bool {
        self.dims.iter().all(|d| d.is_known())
    }

    /// Returns the total number of elements, or `None` if any dimension
    /// is unknown or the count overflows. A scalar shape has one element.
    pub fn num_elements(&self) -> Option<usize> {
        self.dims
            .iter()
            .try_fold(1usize, |acc, d| acc.checked_mul(d.value()?))
    }

    /// Computes the memory footprint in bytes for a given [`DType`].
    pub fn size_bytes(&self, dtype: DType) -> Option<usize> {
        self.num_elements()?.checked_mul(dtype.size_bytes())
    }

    /// Resolves a possibly negative axis against this shape's rank.
    pub fn normalize_axis(&self, axis: i64) -> Option<usize> {
        let rank = self.rank() as i64;
        let resolved = if axis < 0 { rank + axis } else { axis };
        (0..rank).contains(&resolved).then_some(resolved as usize)
    }

    /// Returns a copy with the dimension at `index` replaced.
    pub fn with_dim(&self, index: usize, dim: Dim) -> Shape {
        let mut dims = self.dims.clone();
        dims[index] = dim;
        Shape { dims }
    }

    /// Returns `true` if two shapes are broadcast-compatible.
    ///
    /// Shapes are compatible when, aligning dimensions from the right,
    /// each pair is either equal or one of them is 1. Unknown
    /// dimensions are assumed compatible.
    pub fn is_broadcast_compatible(&self, other: &Shape) -> bool {
        self.broadcast(other).is_some()
    }

    /// Computes the shape both operands broadcast to, if any.
    pub fn broadcast(&self, other: &Shape) -> Option<Shape> {
        let len = self.rank().max(other.rank());
        let mut dims = Vec::with_capacity(len);
        for i in 0..len {
            let a = self.from_right(i);
            let b = other.from_right(i);
            dims.push(a.broadcast(b)?);
        }
        dims.reverse();
        Some(Shape { dims })
    }

    /// The `i`-th dimension counting from the right, padded with 1s.
    fn from_right(&self, i: usize) -> Dim {
        if i < self.dims.len() {
            self.dims[self.dims.len() - 1 - i]
        } else {
            Dim::Known(1)
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "]")
    }
}

/// Convenience: `Shape::from(vec![Dim::Unknown, Dim::Known(3)])`.
impl From<Vec<Dim>> for Shape {
    fn from(dims: Vec<Dim>) -> Self {
        Self::new(dims)
    }
}

/// Convenience: `Shape::from(vec![2, 3])`.
impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Self::known(&dims)
    }
}

/// Convenience: `Shape::from(&[2, 3][..])`.
impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Self::known(dims)
    }
}
