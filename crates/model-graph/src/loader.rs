// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Model loading: file → adapter → records → graph.
//!
//! A source is either a JSON file or a model directory containing
//! `model.json`. The format is detected from the document itself; the
//! optional `model.safetensors` next to it is opened separately through
//! [`WeightFile`](crate::WeightFile).

use crate::{adapters, BuildOutput, FormatAdapter, GraphBuilder, GraphError, ModelRecords};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Default manifest filename inside a model directory.
const MANIFEST_FILE: &str = "model.json";

/// Default SafeTensors filename inside a model directory.
const WEIGHTS_FILE: &str = "model.safetensors";

/// Reads model files with whichever adapter recognises them.
///
/// # Example
/// ```no_run
/// use model_graph::ModelLoader;
/// use std::path::Path;
///
/// let out = ModelLoader::build(Path::new("./models/tiny-cnn")).unwrap();
/// println!("{}", out.graph.summary());
/// for warning in &out.warnings {
///     println!("  warning: {warning}");
/// }
/// ```
pub struct ModelLoader;

impl ModelLoader {
    /// Reads and translates the model at `source`.
    pub fn load(source: &Path) -> Result<ModelRecords, GraphError> {
        let path = Self::resolve(source);
        let content = std::fs::read_to_string(&path)?;
        let doc: Value = serde_json::from_str(&content)?;
        let adapter = Self::detect(&doc)?;
        let records = adapter.parse(&doc)?;
        tracing::info!(
            "loaded '{}' via {} adapter: {} record(s)",
            path.display(),
            adapter.name(),
            records.total_records(),
        );
        Ok(records)
    }

    /// Reads the model at `source` and builds its graph.
    pub fn build(source: &Path) -> Result<BuildOutput, GraphError> {
        let records = Self::load(source)?;
        GraphBuilder::new().build(&records)
    }

    /// Picks the adapter for a parsed document.
    pub fn detect(doc: &Value) -> Result<&'static dyn FormatAdapter, GraphError> {
        adapters::all()
            .into_iter()
            .find(|a| a.detect(doc))
            .ok_or_else(|| GraphError::UnsupportedFormat {
                detail: "expected a layer manifest or a Keras model JSON document".into(),
            })
    }

    /// The JSON file for `source`: itself, or `model.json` inside it.
    pub fn resolve(source: &Path) -> PathBuf {
        if source.is_dir() {
            source.join(MANIFEST_FILE)
        } else {
            source.to_path_buf()
        }
    }

    /// The weight file conventionally stored next to `source`, if present.
    pub fn weights_path(source: &Path) -> Option<PathBuf> {
        let candidate = if source.is_dir() {
            source.join(WEIGHTS_FILE)
        } else {
            source.with_extension("safetensors")
        };
        candidate.is_file().then_some(candidate)
    }
}
