// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The adapter output contract.
//!
//! Every model format is reduced to a flat list of [`LayerRecord`]s before
//! the builder sees it. Records may appear in any order; connections are
//! expressed by name.

use crate::GraphError;
use serde_json::Value;
use shape_algebra::{AttrValue, Attributes, Shape};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;

/// One layer as described by a model file.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LayerRecord {
    /// Unique name within its (sub-)graph.
    pub name: String,
    /// Kind tag in the source format's spelling (`"Conv2D"`, `"linear"`).
    #[serde(alias = "layer_type", alias = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: Attributes,
    /// Names of the producing layers, in input-slot order.
    #[serde(default)]
    pub inputs: Vec<String>,
    /// Shape fed to a source layer, with `null` for a free dimension.
    #[serde(
        default,
        alias = "input_shape",
        skip_serializing_if = "Option::is_none"
    )]
    pub declared_input_shape: Option<Shape>,
    /// Body of a composite layer.
    #[serde(default, alias = "layers", skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<LayerRecord>,
}

impl LayerRecord {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            attributes: Attributes::new(),
            inputs: Vec::new(),
            declared_input_shape: None,
            children: Vec::new(),
        }
    }

    pub fn with_inputs<I, S>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs = inputs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_input_shape(mut self, shape: impl Into<Shape>) -> Self {
        self.declared_input_shape = Some(shape.into());
        self
    }

    pub fn with_children(mut self, children: Vec<LayerRecord>) -> Self {
        self.children = children;
        self
    }
}

/// A model as handed from an adapter to the builder.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ModelRecords {
    pub name: String,
    pub records: Vec<LayerRecord>,
}

impl ModelRecords {
    pub fn new(name: impl Into<String>, records: Vec<LayerRecord>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }

    /// Content hash of the records.
    ///
    /// Two reads of an unchanged model file give the same fingerprint;
    /// caches compare it to decide whether a built graph is stale.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        serde_json::to_vec(self)
            .unwrap_or_default()
            .hash(&mut hasher);
        hasher.finish()
    }

    /// Number of records including nested children.
    pub fn total_records(&self) -> usize {
        fn count(records: &[LayerRecord]) -> usize {
            records.iter().map(|r| 1 + count(&r.children)).sum()
        }
        count(&self.records)
    }
}

/// A model file format.
///
/// Adapters are pure translators: they turn a parsed document into
/// [`ModelRecords`] and never build graphs themselves.
pub trait FormatAdapter: Send + Sync {
    /// Short format name for logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Returns `true` if `doc` looks like this format.
    fn detect(&self, doc: &Value) -> bool;

    /// Translates a parsed document.
    fn parse(&self, doc: &Value) -> Result<ModelRecords, GraphError>;

    /// Reads and translates a file.
    fn read(&self, path: &Path) -> Result<ModelRecords, GraphError> {
        let content = std::fs::read_to_string(path)?;
        let doc: Value = serde_json::from_str(&content)?;
        self.parse(&doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shape_algebra::Dim;

    #[test]
    fn test_record_aliases() {
        let json = r#"{
            "name": "conv1",
            "layer_type": "conv2d",
            "attributes": { "kernel_size": [3, 3], "padding": "same" },
            "input_shape": [null, 3, 32, 32]
        }"#;
        let r: LayerRecord = serde_json::from_str(json).unwrap();
        assert_eq!(r.kind, "conv2d");
        assert!(r.inputs.is_empty());
        assert_eq!(
            r.declared_input_shape.unwrap().dims()[0],
            Dim::Unknown
        );
        assert_eq!(r.attributes["padding"], AttrValue::from("same"));
    }

    #[test]
    fn test_nested_layers_alias() {
        let json = r#"{
            "name": "block", "kind": "composite", "inputs": ["x"],
            "layers": [{ "name": "inner", "kind": "relu" }]
        }"#;
        let r: LayerRecord = serde_json::from_str(json).unwrap();
        assert_eq!(r.children.len(), 1);
        assert_eq!(r.children[0].name, "inner");
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = ModelRecords::new(
            "m",
            vec![LayerRecord::new("x", "input").with_input_shape(vec![1usize, 4])],
        );
        let b = a.clone();
        assert_eq!(a.fingerprint(), b.fingerprint());

        let mut c = a.clone();
        c.records[0] = c.records[0].clone().with_attr("dtype", "f16");
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn test_total_records_counts_children() {
        let m = ModelRecords::new(
            "m",
            vec![
                LayerRecord::new("x", "input"),
                LayerRecord::new("b", "composite").with_children(vec![
                    LayerRecord::new("b1", "relu"),
                    LayerRecord::new("b2", "relu"),
                ]),
            ],
        );
        assert_eq!(m.total_records(), 4);
    }
}
