// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the query layer.
//!
//! Searching and diffing never fail on a built graph; only parsing a
//! textual filter can.

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("invalid filter term '{term}': {detail}")]
    InvalidFilter { term: String, detail: String },
}
