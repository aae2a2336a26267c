// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Node box estimation from label text.
//!
//! A label has one line each for the name, the kind and the output shape,
//! then up to `max_attributes` `key=value` lines. The box is the text
//! extent (widest line × `char_width`, lines × `line_height`) plus
//! padding, never smaller than the configured minimum.

use crate::{LayoutConfig, LayoutRecord};
use model_graph::Node;

/// Width, height and whether the size is a fallback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeSize {
    pub width: f64,
    pub height: f64,
    pub estimated: bool,
}

impl NodeSize {
    fn minimum(config: &LayoutConfig) -> Self {
        Self {
            width: config.min_width,
            height: config.min_height,
            estimated: true,
        }
    }
}

/// Label lines of `node`, each cut to `max_label_chars`.
pub fn label_lines(node: &Node, config: &LayoutConfig) -> Vec<String> {
    let mut lines = vec![node.name().to_string()];
    let kind = if node.source_kind().is_empty() {
        node.kind().to_string()
    } else {
        node.source_kind().to_string()
    };
    lines.push(kind);
    if let Some(shape) = &node.output_fact().shape {
        lines.push(shape.to_string());
    }
    lines.extend(
        node.attributes()
            .iter()
            .take(config.max_attributes)
            .map(|(key, value)| format!("{key}={value}")),
    );
    lines
        .into_iter()
        .map(|line| truncate(&line, config.max_label_chars))
        .collect()
}

fn truncate(line: &str, max_chars: usize) -> String {
    if line.chars().count() <= max_chars {
        return line.to_string();
    }
    let mut cut: String = line.chars().take(max_chars.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// Box of a plain node. An unknown output shape gives the minimum size.
pub fn estimate(node: &Node, config: &LayoutConfig) -> NodeSize {
    if node.output_fact().shape.is_none() {
        return NodeSize::minimum(config);
    }
    let (width, height) = text_box(&label_lines(node, config), config);
    NodeSize {
        width: width.max(config.min_width),
        height: height.max(config.min_height),
        estimated: false,
    }
}

/// Box of a composite: its nested layout plus padding and a title line.
/// An empty body gives the minimum size.
pub fn composite(node: &Node, nested: &LayoutRecord, config: &LayoutConfig) -> NodeSize {
    if nested.nodes.is_empty() {
        return NodeSize::minimum(config);
    }
    let title = truncate(node.name(), config.max_label_chars);
    let title_width = title.chars().count() as f64 * config.char_width + 2.0 * config.padding_x;
    let width = (nested.width + 2.0 * config.composite_padding).max(title_width);
    let height = nested.height + 2.0 * config.composite_padding + config.line_height;
    NodeSize {
        width: width.max(config.min_width),
        height: height.max(config.min_height),
        estimated: false,
    }
}

fn text_box(lines: &[String], config: &LayoutConfig) -> (f64, f64) {
    let widest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    (
        widest as f64 * config.char_width + 2.0 * config.padding_x,
        lines.len() as f64 * config.line_height + 2.0 * config.padding_y,
    )
}
