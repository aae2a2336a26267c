// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # model-graph
//!
//! One directed-graph representation for neural-network models from any
//! framework.
//!
//! - [`LayerRecord`] / [`FormatAdapter`]: the contract every model format
//!   is reduced to ([`adapters`] has the manifest and Keras readers).
//! - [`GraphBuilder`]: records → [`ModelGraph<Built>`], with inferred
//!   tensor facts on every edge and non-fatal [`BuildWarning`]s.
//! - [`ModelGraph`]: nodes, edges, topological order, input / output sets,
//!   with a **type-state pattern** (`Linked` → `Built`).
//! - [`ModelLoader`]: file → adapter → graph.
//! - [`WeightFile`]: per-node weight statistics from SafeTensors.
//!
//! # Example
//! ```no_run
//! use model_graph::ModelLoader;
//! use std::path::Path;
//!
//! let out = ModelLoader::build(Path::new("./models/tiny-cnn/model.json")).unwrap();
//! println!("{}", out.graph.summary());
//! for &id in out.graph.topological_order() {
//!     println!("  {}", out.graph.node(id).summary());
//! }
//! ```

pub mod adapters;
pub mod builder;
mod edge;
mod error;
pub mod graph;
mod loader;
mod node;
mod record;
mod weights;

pub use builder::{BuildOutput, GraphBuilder};
pub use edge::{Edge, EdgeId};
pub use error::{BuildWarning, GraphError};
pub use graph::{Built, GraphState, Linked, ModelGraph};
pub use loader::ModelLoader;
pub use node::{Node, NodeId, Position};
pub use record::{FormatAdapter, LayerRecord, ModelRecords};
pub use weights::{Summary, WeightFile, WeightMeta, WeightStats};
