// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! A single tensor dimension, possibly unknown.

use std::fmt;

/// One dimension of a [`crate::Shape`].
///
/// `Unknown` stands for a symbolic or dynamic size (typically the batch
/// axis). Arithmetic involving an unknown dimension yields `Unknown`.
///
/// Serialized as a JSON number, or `null` when unknown, which matches how
/// Keras writes `batch_input_shape`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(from = "Option<usize>", into = "Option<usize>")]
pub enum Dim {
    /// A concrete size.
    Known(usize),
    /// A symbolic or dynamic size.
    Unknown,
}

impl Dim {
    /// Returns the concrete size, if known.
    pub fn value(self) -> Option<usize> {
        match self {
            Dim::Known(n) => Some(n),
            Dim::Unknown => None,
        }
    }

    pub fn is_known(self) -> bool {
        matches!(self, Dim::Known(_))
    }

    /// Applies `f` to a known size; unknown stays unknown.
    pub fn map(self, f: impl FnOnce(usize) -> usize) -> Dim {
        match self {
            Dim::Known(n) => Dim::Known(f(n)),
            Dim::Unknown => Dim::Unknown,
        }
    }

    /// Applies a fallible `f` to a known size; unknown stays unknown.
    pub fn try_map<E>(self, f: impl FnOnce(usize) -> Result<usize, E>) -> Result<Dim, E> {
        match self {
            Dim::Known(n) => f(n).map(Dim::Known),
            Dim::Unknown => Ok(Dim::Unknown),
        }
    }

    /// Sum of two dimensions. Overflow gives `Unknown`.
    pub fn add(self, other: Dim) -> Dim {
        match (self, other) {
            (Dim::Known(a), Dim::Known(b)) => a.checked_add(b).into(),
            _ => Dim::Unknown,
        }
    }

    /// Product of two dimensions. Overflow gives `Unknown`.
    pub fn mul(self, other: Dim) -> Dim {
        match (self, other) {
            (Dim::Known(a), Dim::Known(b)) => a.checked_mul(b).into(),
            _ => Dim::Unknown,
        }
    }

    /// Returns `false` only when both sides are known and differ.
    pub fn compatible(self, other: Dim) -> bool {
        match (self, other) {
            (Dim::Known(a), Dim::Known(b)) => a == b,
            _ => true,
        }
    }

    /// Merges two dimensions that must agree, preferring the known side.
    ///
    /// Returns `None` on a known mismatch.
    pub fn unify(self, other: Dim) -> Option<Dim> {
        match (self, other) {
            (Dim::Known(a), Dim::Known(b)) if a == b => Some(Dim::Known(a)),
            (Dim::Known(_), Dim::Known(_)) => None,
            (Dim::Known(a), Dim::Unknown) | (Dim::Unknown, Dim::Known(a)) => Some(Dim::Known(a)),
            (Dim::Unknown, Dim::Unknown) => Some(Dim::Unknown),
        }
    }

    /// Broadcasts two dimensions under numpy rules.
    ///
    /// Returns `None` when both are known, differ, and neither is 1.
    /// Any pairing with an unknown dimension yields `Unknown`.
    pub fn broadcast(self, other: Dim) -> Option<Dim> {
        match (self, other) {
            (Dim::Known(a), Dim::Known(b)) if a == b => Some(Dim::Known(a)),
            (Dim::Known(1), Dim::Known(b)) => Some(Dim::Known(b)),
            (Dim::Known(a), Dim::Known(1)) => Some(Dim::Known(a)),
            (Dim::Known(_), Dim::Known(_)) => None,
            _ => Some(Dim::Unknown),
        }
    }
}

impl From<usize> for Dim {
    fn from(n: usize) -> Self {
        Dim::Known(n)
    }
}

impl From<Option<usize>> for Dim {
    fn from(value: Option<usize>) -> Self {
        value.map_or(Dim::Unknown, Dim::Known)
    }
}

impl From<Dim> for Option<usize> {
    fn from(dim: Dim) -> Self {
        dim.value()
    }
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dim::Known(n) => write!(f, "{n}"),
            Dim::Unknown => f.write_str("?"),
        }
    }
}
