// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the layout engine.
//!
//! Computing a layout never fails; these cover configuration files and
//! checking a stored record against a graph.

/// Errors raised around, but never by, layout computation.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    /// The configuration file could not be read, parsed or written.
    #[error("configuration error: {0}")]
    Config(String),

    /// A configuration value is out of range.
    #[error("invalid configuration value '{field}': {detail}")]
    InvalidConfig { field: &'static str, detail: String },

    /// A layout record does not cover the graph it is checked against.
    #[error("layout does not match graph '{graph}': {detail}")]
    Mismatch { graph: String, detail: String },
}
