// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # shape-algebra
//!
//! Static tensor metadata for neural-network graphs.
//!
//! This crate provides:
//! - [`Dim`] and [`Shape`]: dimensions that may be unknown (a free batch axis).
//! - [`DType`]: element data types.
//! - [`TensorFact`]: what is statically known about a tensor.
//! - [`OpKind`]: the operator vocabulary shared by every model format.
//! - [`Attributes`]: free-form per-node hyper-parameters.
//! - [`infer`]: one output-shape rule per operator family.
//!
//! Nothing here touches tensor data.

mod attr;
mod dim;
mod dtype;
mod error;
mod fact;
pub mod infer;
mod op;
mod shape;

pub use attr::{lookup, AttrValue, Attributes};
pub use dim::Dim;
pub use dtype::DType;
pub use error::ShapeError;
pub use fact::TensorFact;
pub use infer::infer;
pub use op::{MergeMode, OpKind, PoolMode};
pub use shape::Shape;
