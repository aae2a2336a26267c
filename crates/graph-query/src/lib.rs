// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # graph-query
//!
//! Read-only operations over built model graphs:
//!
//! - [`search`]: lazy, restartable node search; [`NodeFilter`] parses
//!   `name:`, `kind:` and `attr:` terms.
//! - [`diff`]: name-matched structural comparison of two graphs into a
//!   serialisable [`DiffReport`].
//!
//! # Example
//! ```no_run
//! use graph_query::{diff, search, NodeFilter};
//! use model_graph::ModelLoader;
//! use std::path::Path;
//!
//! let a = ModelLoader::build(Path::new("runs/mnist_1.json")).unwrap().graph;
//! let b = ModelLoader::build(Path::new("runs/mnist_2.json")).unwrap().graph;
//! println!("{}", diff(&a, &b).summary());
//!
//! let filter: NodeFilter = "kind:convolution".parse().unwrap();
//! for name in search(&b, |n| filter.matches(n)).names() {
//!     println!("{name}");
//! }
//! ```

pub mod diff;
mod error;
mod search;

pub use diff::{diff, DiffReport};
pub use error::QueryError;
pub use search::{search, NodeFilter, Search};
