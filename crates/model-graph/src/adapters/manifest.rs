// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! JSON model manifest parsing.
//!
//! The manifest is the format-neutral description of a model: the
//! records the builder consumes, plus a model name and default dtype.
//!
//! # Format
//! ```json
//! {
//!   "name": "tiny-cnn",
//!   "dtype": "f32",
//!   "layers": [
//!     { "name": "x", "kind": "input", "input_shape": [null, 3, 32, 32] },
//!     {
//!       "name": "conv1",
//!       "kind": "conv2d",
//!       "inputs": ["x"],
//!       "attributes": { "out_channels": 8, "kernel_size": 3, "padding": 1 }
//!     },
//!     ...
//!   ]
//! }
//! ```

use crate::{FormatAdapter, GraphError, LayerRecord, ModelRecords};
use serde::Deserialize;
use serde_json::Value;
use shape_algebra::{AttrValue, DType};
use std::path::Path;

/// Top-level manifest, deserialized from `model.json`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ModelManifest {
    /// Human-readable model name.
    pub name: String,
    /// Element type of declared inputs without their own `dtype`.
    #[serde(default = "default_dtype")]
    pub dtype: String,
    pub layers: Vec<LayerRecord>,
}

fn default_dtype() -> String {
    "f32".to_string()
}

impl ModelManifest {
    /// Loads a manifest from a JSON file path.
    pub fn from_file(path: &Path) -> Result<Self, GraphError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parses a manifest from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        let manifest: Self = serde_json::from_str(json)?;
        Ok(manifest)
    }

    /// Checks what the builder cannot: at least one layer, a known dtype
    /// and non-empty names and kinds at every nesting level.
    ///
    /// Duplicate names and dangling inputs are left to the builder, which
    /// reports them with graph context.
    pub fn validate(&self) -> Result<(), GraphError> {
        if self.layers.is_empty() {
            return Err(GraphError::InvalidManifest {
                detail: format!("manifest '{}' contains no layers", self.name),
            });
        }
        DType::from_str_loose(&self.dtype).ok_or_else(|| GraphError::InvalidManifest {
            detail: format!("unsupported dtype '{}'", self.dtype),
        })?;

        fn check(layers: &[LayerRecord]) -> Result<(), GraphError> {
            for layer in layers {
                if layer.name.trim().is_empty() {
                    return Err(GraphError::InvalidManifest {
                        detail: format!("layer of kind '{}' has an empty name", layer.kind),
                    });
                }
                if layer.kind.trim().is_empty() {
                    return Err(GraphError::InvalidManifest {
                        detail: format!("layer '{}' has an empty kind", layer.name),
                    });
                }
                check(&layer.children)?;
            }
            Ok(())
        }
        check(&self.layers)
    }

    /// Validates and converts into builder input. The manifest dtype is
    /// stamped on declared inputs that do not name their own.
    pub fn into_records(self) -> Result<ModelRecords, GraphError> {
        self.validate()?;
        let dtype = self.dtype;
        let mut layers = self.layers;
        fn stamp(layers: &mut [LayerRecord], dtype: &str) {
            for layer in layers {
                if layer.declared_input_shape.is_some() && !layer.attributes.contains_key("dtype") {
                    layer
                        .attributes
                        .insert("dtype".into(), AttrValue::from(dtype));
                }
                stamp(&mut layer.children, dtype);
            }
        }
        stamp(&mut layers, &dtype);
        Ok(ModelRecords::new(self.name, layers))
    }
}

/// Adapter for [`ModelManifest`] documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestAdapter;

impl FormatAdapter for ManifestAdapter {
    fn name(&self) -> &'static str {
        "manifest"
    }

    fn detect(&self, doc: &Value) -> bool {
        doc.get("layers").is_some_and(Value::is_array) && doc.get("class_name").is_none()
    }

    fn parse(&self, doc: &Value) -> Result<ModelRecords, GraphError> {
        let manifest = ModelManifest::deserialize(doc)?;
        manifest.into_records()
    }
}
