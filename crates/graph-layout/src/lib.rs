// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # graph-layout
//!
//! Deterministic left-to-right layered layout of a built `ModelGraph`.
//!
//! # Pipeline
//!
//! | Stage | Module | Result |
//! |---|---|---|
//! | Ranking | [`rank`] | longest path from the sources |
//! | Ordering | [`order`] | barycenter sweeps, fewest crossings kept |
//! | Sizing | [`size`] | boxes from label text |
//! | Routing | [`route`] | orthogonal polylines, lanes for skips |
//!
//! Composite nodes are laid out recursively and placed as opaque boxes.
//! A layout never fails; nodes without shape information get the minimum
//! box and are flagged `estimated`.
//!
//! # Example
//! ```no_run
//! use graph_layout::{LayoutConfig, LayoutEngine};
//! use model_graph::ModelLoader;
//! use std::path::Path;
//!
//! let config = LayoutConfig::from_file(Path::new("layout.toml")).unwrap_or_default();
//! let out = ModelLoader::build(Path::new("./model")).unwrap();
//! let record = LayoutEngine::new(config).compute(&out.graph);
//! record.validate(&out.graph).unwrap();
//! println!("{} crossing(s)", record.crossings);
//! ```

mod cache;
mod config;
mod engine;
mod error;
pub mod order;
pub mod rank;
mod record;
pub mod route;
pub mod size;

pub use cache::{CacheStats, CachedModel, ModelCache};
pub use config::LayoutConfig;
pub use engine::LayoutEngine;
pub use error::LayoutError;
pub use record::{EdgeLayout, LayoutRecord, NodeLayout, Point};
