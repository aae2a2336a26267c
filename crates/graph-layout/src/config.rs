// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Layout configuration loaded from TOML files or constructed programmatically.
//!
//! Every field has a default, so a file only lists what it changes.
//!
//! # TOML Format
//! ```toml
//! rank_gap = 96.0
//! node_gap = 24.0
//! char_width = 7.5
//! max_passes = 32
//! parallel = false
//! ```

use crate::LayoutError;
use std::path::Path;

/// Spacing, text metrics and iteration limits of the layered layout.
///
/// Lengths are in abstract canvas units; the renderer decides their scale.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Horizontal gap between rank columns; edges bend in its middle.
    pub rank_gap: f64,
    /// Vertical gap between nodes of one rank.
    pub node_gap: f64,
    /// Distance between the horizontal lanes of rank-skipping edges.
    pub lane_gap: f64,
    /// Offset between parallel edges joining the same two nodes.
    pub parallel_gap: f64,
    /// Width of one label character.
    pub char_width: f64,
    /// Height of one label line.
    pub line_height: f64,
    pub padding_x: f64,
    pub padding_y: f64,
    pub min_width: f64,
    pub min_height: f64,
    /// Longer label lines are cut with an ellipsis.
    pub max_label_chars: usize,
    /// Attribute lines shown under the kind and shape.
    pub max_attributes: usize,
    /// Upper bound on barycenter sweeps.
    pub max_passes: usize,
    /// Margin around a nested layout inside its composite node.
    pub composite_padding: f64,
    /// Lay out sibling composites on the rayon thread pool.
    pub parallel: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            rank_gap: 80.0,
            node_gap: 24.0,
            lane_gap: 12.0,
            parallel_gap: 6.0,
            char_width: 7.0,
            line_height: 16.0,
            padding_x: 12.0,
            padding_y: 8.0,
            min_width: 96.0,
            min_height: 40.0,
            max_label_chars: 32,
            max_attributes: 3,
            max_passes: 24,
            composite_padding: 16.0,
            parallel: true,
        }
    }
}

impl LayoutConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, LayoutError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            LayoutError::Config(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, LayoutError> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| LayoutError::Config(format!("TOML parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, LayoutError> {
        toml::to_string_pretty(self)
            .map_err(|e| LayoutError::Config(format!("TOML serialise error: {e}")))
    }

    /// Rejects negative or non-finite lengths and a zero character box.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let lengths = [
            ("rank_gap", self.rank_gap),
            ("node_gap", self.node_gap),
            ("lane_gap", self.lane_gap),
            ("parallel_gap", self.parallel_gap),
            ("padding_x", self.padding_x),
            ("padding_y", self.padding_y),
            ("min_width", self.min_width),
            ("min_height", self.min_height),
            ("composite_padding", self.composite_padding),
        ];
        for (field, value) in lengths {
            if !value.is_finite() || value < 0.0 {
                return Err(LayoutError::InvalidConfig {
                    field,
                    detail: format!("expected a finite non-negative length, got {value}"),
                });
            }
        }
        for (field, value) in [("char_width", self.char_width), ("line_height", self.line_height)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(LayoutError::InvalidConfig {
                    field,
                    detail: format!("expected a positive length, got {value}"),
                });
            }
        }
        if self.max_label_chars < 4 {
            return Err(LayoutError::InvalidConfig {
                field: "max_label_chars",
                detail: "labels need at least 4 characters".into(),
            });
        }
        Ok(())
    }
}
