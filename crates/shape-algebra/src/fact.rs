// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! What is statically known about a tensor flowing along an edge.

use crate::{DType, Shape};
use std::fmt;

/// Shape and element type of a tensor, each possibly unknown.
///
/// `shape: None` means even the rank is unknown, which is what a node
/// whose inference failed hands to its consumers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct TensorFact {
    pub shape: Option<Shape>,
    pub dtype: Option<DType>,
}

impl TensorFact {
    pub fn new(shape: Shape, dtype: DType) -> Self {
        Self {
            shape: Some(shape),
            dtype: Some(dtype),
        }
    }

    /// A fact with nothing known.
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Returns a copy carrying `shape` and this fact's dtype.
    pub fn with_shape(&self, shape: Shape) -> Self {
        Self {
            shape: Some(shape),
            dtype: self.dtype,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.shape.is_none()
    }
}

impl fmt::Display for TensorFact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.shape {
            Some(shape) => write!(f, "{shape}")?,
            None => f.write_str("?")?,
        }
        if let Some(dtype) = self.dtype {
            write!(f, " {dtype}")?;
        }
        Ok(())
    }
}
