// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Keras `model.to_json()` documents.
//!
//! Handles:
//! - `Sequential` models: layers chained in order. When the first layer
//!   declares its own input shape an `input` node is synthesized in front.
//! - `Functional` / `Model` graphs, with both the legacy
//!   `[[["name", 0, 0, {}]]]` and the Keras 3 `{"args": [...]}` inbound
//!   node encodings. Only a layer's first call is wired.
//! - Models nested as layers, which become composite records.
//!
//! Keras defaults that other formats spell differently are made explicit:
//! `data_format = "channels_last"` on spatial layers and `axis = -1` on
//! `Concatenate`.

use crate::{FormatAdapter, GraphError, LayerRecord, ModelRecords};
use serde_json::{Map, Value};
use shape_algebra::{AttrValue, Dim, OpKind, Shape};

const MODEL_CLASSES: &[&str] = &["Sequential", "Functional", "Model"];

/// Config keys that are structural rather than hyper-parameters.
const SKIPPED_KEYS: &[&str] = &[
    "name",
    "trainable",
    "batch_input_shape",
    "batch_shape",
    "layers",
    "input_layers",
    "output_layers",
];

/// Adapter for Keras JSON model descriptions.
#[derive(Debug, Clone, Copy, Default)]
pub struct KerasAdapter;

impl FormatAdapter for KerasAdapter {
    fn name(&self) -> &'static str {
        "keras"
    }

    fn detect(&self, doc: &Value) -> bool {
        doc.get("class_name")
            .and_then(Value::as_str)
            .is_some_and(|c| MODEL_CLASSES.contains(&c))
            && doc.get("config").is_some_and(Value::is_object)
    }

    fn parse(&self, doc: &Value) -> Result<ModelRecords, GraphError> {
        let (name, records) = parse_model(doc)?;
        tracing::debug!("keras model '{name}': {} top-level layers", records.len());
        Ok(ModelRecords::new(name, records))
    }
}

fn invalid(detail: impl Into<String>) -> GraphError {
    GraphError::InvalidManifest {
        detail: detail.into(),
    }
}

fn parse_model(doc: &Value) -> Result<(String, Vec<LayerRecord>), GraphError> {
    let class = doc
        .get("class_name")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("model has no class_name"))?;
    let config = doc
        .get("config")
        .and_then(Value::as_object)
        .ok_or_else(|| invalid(format!("{class} model has no config")))?;
    let name = config
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| class.to_lowercase());
    let layers = config
        .get("layers")
        .and_then(Value::as_array)
        .ok_or_else(|| invalid(format!("model '{name}' has no layer list")))?;

    let records = match class {
        "Sequential" => sequential(layers)?,
        _ => functional(layers)?,
    };
    Ok((name, records))
}

fn sequential(layers: &[Value]) -> Result<Vec<LayerRecord>, GraphError> {
    let mut records = Vec::with_capacity(layers.len() + 1);
    let mut previous: Option<String> = None;

    for (i, entry) in layers.iter().enumerate() {
        let mut record = convert_layer(entry)?;
        if i == 0 && OpKind::from_str_loose(&record.kind) != Some(OpKind::Input) {
            let shape = record.declared_input_shape.take().or_else(|| {
                entry
                    .pointer("/build_config/input_shape")
                    .and_then(shape_from_json)
            });
            if let Some(shape) = shape {
                let name = synthetic_input_name(layers);
                let mut input = LayerRecord::new(name.clone(), "InputLayer").with_input_shape(shape);
                if let Some(dtype) = record.attributes.get("dtype") {
                    input.attributes.insert("dtype".into(), dtype.clone());
                }
                records.push(input);
                previous = Some(name);
            }
        }
        if let Some(prev) = previous.take() {
            record.inputs = vec![prev];
        }
        previous = Some(record.name.clone());
        records.push(record);
    }
    Ok(records)
}

/// `input`, unless a layer already uses that name.
fn synthetic_input_name(layers: &[Value]) -> String {
    let taken = |candidate: &str| {
        layers
            .iter()
            .any(|l| layer_name(l).as_deref() == Some(candidate))
    };
    let mut name = "input".to_string();
    let mut n = 0;
    while taken(&name) {
        n += 1;
        name = format!("input_{n}");
    }
    name
}

fn functional(layers: &[Value]) -> Result<Vec<LayerRecord>, GraphError> {
    layers
        .iter()
        .map(|entry| {
            let mut record = convert_layer(entry)?;
            record.inputs = entry
                .get("inbound_nodes")
                .map(inbound_names)
                .unwrap_or_default();
            Ok(record)
        })
        .collect()
}

/// Producer names of a layer's first call.
fn inbound_names(nodes: &Value) -> Vec<String> {
    let Some(first) = nodes.as_array().and_then(|calls| calls.first()) else {
        return Vec::new();
    };
    match first {
        // Legacy: [["producer", node_index, tensor_index, {kwargs}], ...]
        Value::Array(conns) => conns
            .iter()
            .filter_map(|c| c.get(0).and_then(Value::as_str).map(str::to_string))
            .collect(),
        // Keras 3: {"args": [tensor | [tensor, ...]], "kwargs": {...}}
        Value::Object(call) => {
            let mut names = Vec::new();
            if let Some(args) = call.get("args") {
                collect_history(args, &mut names);
            }
            names
        }
        _ => Vec::new(),
    }
}

fn collect_history(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Array(items) => items.iter().for_each(|v| collect_history(v, out)),
        Value::Object(obj) if obj.get("class_name").and_then(Value::as_str) == Some("__keras_tensor__") => {
            if let Some(name) = value
                .pointer("/config/keras_history/0")
                .and_then(Value::as_str)
            {
                out.push(name.to_string());
            }
        }
        _ => {}
    }
}

fn layer_name(entry: &Value) -> Option<String> {
    entry
        .get("name")
        .or_else(|| entry.pointer("/config/name"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn convert_layer(entry: &Value) -> Result<LayerRecord, GraphError> {
    let class = entry
        .get("class_name")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("layer has no class_name"))?;
    let name = layer_name(entry).ok_or_else(|| invalid(format!("{class} layer has no name")))?;
    let mut record = LayerRecord::new(name, class);

    if MODEL_CLASSES.contains(&class) {
        let (_, children) = parse_model(entry)?;
        record.children = children;
        return Ok(record);
    }

    let empty = Map::new();
    let config = entry.get("config").and_then(Value::as_object).unwrap_or(&empty);
    record.declared_input_shape = config
        .get("batch_input_shape")
        .or_else(|| config.get("batch_shape"))
        .and_then(shape_from_json);

    for (key, value) in config {
        if SKIPPED_KEYS.contains(&key.as_str()) {
            continue;
        }
        if let Some(attr) = attr_from_json(key, value) {
            record.attributes.insert(key.clone(), attr);
        }
    }

    match OpKind::from_str_loose(class) {
        Some(OpKind::Convolution | OpKind::Pooling(_)) => {
            record
                .attributes
                .entry("data_format".into())
                .or_insert_with(|| "channels_last".into());
        }
        Some(OpKind::Merge(shape_algebra::MergeMode::Concat)) => {
            record
                .attributes
                .entry("axis".into())
                .or_insert(AttrValue::Int(-1));
        }
        _ => {}
    }
    Ok(record)
}

/// Converts one config entry. Nested objects are dropped except dtype
/// policies and regularizers, which are reduced to strings.
fn attr_from_json(key: &str, value: &Value) -> Option<AttrValue> {
    if key.ends_with("_regularizer") {
        return regularizer_caption(value).map(AttrValue::Str);
    }
    if key == "dtype" {
        if let Some(policy) = value.pointer("/config/name").and_then(Value::as_str) {
            return Some(policy.into());
        }
    }
    scalar_or_list(value)
}

fn scalar_or_list(value: &Value) -> Option<AttrValue> {
    match value {
        Value::Bool(b) => Some(AttrValue::Bool(*b)),
        Value::Number(n) => n
            .as_i64()
            .map(AttrValue::Int)
            .or_else(|| n.as_f64().map(AttrValue::Float)),
        Value::String(s) => Some(AttrValue::Str(s.clone())),
        Value::Array(items) => items
            .iter()
            .map(scalar_or_list)
            .collect::<Option<Vec<_>>>()
            .map(AttrValue::List),
        Value::Null | Value::Object(_) => None,
    }
}

/// `[null, 28, 28, 1]` style shapes; anything else is not a shape.
fn shape_from_json(value: &Value) -> Option<Shape> {
    value
        .as_array()?
        .iter()
        .map(|d| match d {
            Value::Null => Some(Dim::Unknown),
            other => other.as_u64().map(|n| Dim::Known(n as usize)),
        })
        .collect::<Option<Vec<_>>>()
        .map(Shape::new)
}

fn regularizer_caption(value: &Value) -> Option<String> {
    let config = value.get("config")?;
    let coefficient = |k: &str| config.get(k).and_then(Value::as_f64).unwrap_or(0.0);
    let (l1, l2) = (coefficient("l1"), coefficient("l2"));
    match (l1 != 0.0, l2 != 0.0) {
        (true, true) => Some(format!("L1-L2 - Elasticnet ({l1}, {l2})")),
        (true, false) => Some(format!("L1 - Lasso ({l1})")),
        (false, true) => Some(format!("L2 - Ridge ({l2})")),
        (false, false) => None,
    }
}

/// Human-readable name of a Keras activation function.
pub fn activation_caption(activation: &str) -> Option<&'static str> {
    Some(match activation {
        "elu" => "Exponential linear unit",
        "exponential" => "Exponential",
        "hard_sigmoid" => "Hard sigmoid",
        "linear" => "Linear",
        "relu" => "Rectified linear unit",
        "selu" => "Scaled Exponential Linear Unit (SELU)",
        "sigmoid" => "Sigmoid",
        "softmax" => "Soft-max",
        "softplus" => "Soft-plus",
        "softsign" => "Soft-sign",
        "swish" => "Swish",
        "tanh" => "Hyperbolic tangent",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GraphBuilder;
    use serde_json::json;

    fn mnist_sequential() -> Value {
        json!({
            "class_name": "Sequential",
            "config": {
                "name": "mnist",
                "layers": [
                    { "class_name": "Conv2D", "config": {
                        "name": "conv2d", "trainable": true, "dtype": "float32",
                        "batch_input_shape": [null, 28, 28, 1],
                        "filters": 32, "kernel_size": [3, 3], "strides": [1, 1],
                        "padding": "valid", "dilation_rate": [1, 1],
                        "activation": "relu", "use_bias": true,
                        "kernel_initializer": { "class_name": "GlorotUniform", "config": { "seed": null } },
                        "kernel_regularizer": { "class_name": "L2", "config": { "l2": 0.01 } }
                    }},
                    { "class_name": "MaxPooling2D", "config": {
                        "name": "max_pooling2d", "pool_size": [2, 2], "strides": [2, 2], "padding": "valid"
                    }},
                    { "class_name": "Flatten", "config": { "name": "flatten" } },
                    { "class_name": "Dropout", "config": { "name": "dropout", "rate": 0.5 } },
                    { "class_name": "Dense", "config": { "name": "dense", "units": 10, "activation": "softmax" } }
                ]
            },
            "keras_version": "2.4.0",
            "backend": "tensorflow"
        })
    }

    #[test]
    fn test_sequential_synthesizes_input() {
        let records = KerasAdapter.parse(&mnist_sequential()).unwrap();
        assert_eq!(records.name, "mnist");
        let names: Vec<_> = records.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["input", "conv2d", "max_pooling2d", "flatten", "dropout", "dense"]);
        assert_eq!(records.records[1].inputs, ["input"]);
        assert!(records.records[1].declared_input_shape.is_none());
    }

    #[test]
    fn test_sequential_shapes() {
        let records = KerasAdapter.parse(&mnist_sequential()).unwrap();
        let out = GraphBuilder::new().build(&records).unwrap();
        assert!(out.warnings.is_empty(), "{:?}", out.warnings);

        let shape = |n: &str| out.graph.node_by_name(n).unwrap().output_fact().shape.clone().unwrap();
        assert_eq!(shape("conv2d").to_string(), "[?, 26, 26, 32]");
        assert_eq!(shape("max_pooling2d").to_string(), "[?, 13, 13, 32]");
        assert_eq!(shape("flatten").to_string(), "[?, 5408]");
        assert_eq!(shape("dense").to_string(), "[?, 10]");
    }

    #[test]
    fn test_config_attributes() {
        let records = KerasAdapter.parse(&mnist_sequential()).unwrap();
        let conv = &records.records[1].attributes;
        assert_eq!(conv["data_format"], AttrValue::from("channels_last"));
        assert_eq!(conv["kernel_regularizer"], AttrValue::from("L2 - Ridge (0.01)"));
        assert!(!conv.contains_key("kernel_initializer"));
        assert!(!conv.contains_key("trainable"));
        assert_eq!(conv["activation"].as_str().and_then(activation_caption), Some("Rectified linear unit"));
    }

    #[test]
    fn test_functional_legacy_inbound_nodes() {
        let doc = json!({
            "class_name": "Functional",
            "config": {
                "name": "two_heads",
                "layers": [
                    { "class_name": "InputLayer", "name": "in",
                      "config": { "batch_input_shape": [null, 16], "dtype": "float32", "name": "in" },
                      "inbound_nodes": [] },
                    { "class_name": "Dense", "name": "a", "config": { "name": "a", "units": 8 },
                      "inbound_nodes": [[["in", 0, 0, {}]]] },
                    { "class_name": "Dense", "name": "b", "config": { "name": "b", "units": 4 },
                      "inbound_nodes": [[["in", 0, 0, {}]]] },
                    { "class_name": "Concatenate", "name": "cat", "config": { "name": "cat" },
                      "inbound_nodes": [[["a", 0, 0, {}], ["b", 0, 0, {}]]] }
                ],
                "input_layers": [["in", 0, 0]],
                "output_layers": [["cat", 0, 0]]
            }
        });
        let records = KerasAdapter.parse(&doc).unwrap();
        assert_eq!(records.records[3].inputs, ["a", "b"]);
        let out = GraphBuilder::new().build(&records).unwrap();
        let cat = out.graph.node_by_name("cat").unwrap();
        assert_eq!(cat.output_fact().shape.as_ref().unwrap().to_string(), "[?, 12]");
    }

    #[test]
    fn test_functional_keras3_inbound_nodes() {
        let tensor = |from: &str| json!({
            "class_name": "__keras_tensor__",
            "config": { "shape": [null, 4], "dtype": "float32", "keras_history": [from, 0, 0] }
        });
        let doc = json!({
            "module": "keras",
            "class_name": "Functional",
            "config": {
                "name": "functional",
                "layers": [
                    { "module": "keras.layers", "class_name": "InputLayer", "name": "input_layer",
                      "config": { "batch_shape": [null, 8], "dtype": "float32", "sparse": false, "name": "input_layer" },
                      "inbound_nodes": [] },
                    { "module": "keras.layers", "class_name": "Dense", "name": "dense",
                      "config": {
                          "name": "dense", "units": 4, "activation": "relu",
                          "dtype": { "module": "keras", "class_name": "DTypePolicy", "config": { "name": "float32" } }
                      },
                      "build_config": { "input_shape": [null, 8] },
                      "inbound_nodes": [{ "args": [tensor("input_layer")], "kwargs": {} }] },
                    { "module": "keras.layers", "class_name": "Add", "name": "add",
                      "config": { "name": "add" },
                      "inbound_nodes": [{ "args": [[tensor("dense"), tensor("dense")]], "kwargs": {} }] }
                ]
            }
        });
        let records = KerasAdapter.parse(&doc).unwrap();
        assert_eq!(records.records[1].attributes["dtype"], AttrValue::from("float32"));
        assert_eq!(records.records[2].inputs, ["dense", "dense"]);

        let out = GraphBuilder::new().build(&records).unwrap();
        assert!(out.warnings.is_empty(), "{:?}", out.warnings);
        let add = out.graph.node_by_name("add").unwrap();
        assert_eq!(add.inputs().len(), 2);
        assert_eq!(add.output_fact().shape.as_ref().unwrap().to_string(), "[?, 4]");
    }

    #[test]
    fn test_nested_model_becomes_composite() {
        let doc = json!({
            "class_name": "Sequential",
            "config": {
                "name": "outer",
                "layers": [
                    { "class_name": "InputLayer", "config": { "name": "x", "batch_input_shape": [null, 32] } },
                    { "class_name": "Sequential", "config": {
                        "name": "block",
                        "layers": [
                            { "class_name": "Dense", "config": { "name": "d1", "units": 16 } },
                            { "class_name": "Dense", "config": { "name": "d2", "units": 8 } }
                        ]
                    }},
                    { "class_name": "Dense", "config": { "name": "head", "units": 2 } }
                ]
            }
        });
        let records = KerasAdapter.parse(&doc).unwrap();
        assert_eq!(records.records[1].children.len(), 2);

        let out = GraphBuilder::new().build(&records).unwrap();
        assert!(out.warnings.is_empty(), "{:?}", out.warnings);
        let block = out.graph.node_by_name("block").unwrap();
        assert_eq!(block.kind(), OpKind::Composite);
        assert_eq!(block.output_fact().shape.as_ref().unwrap().to_string(), "[?, 8]");
        assert_eq!(out.graph.total_nodes(), 5);
    }

    #[test]
    fn test_detect() {
        assert!(KerasAdapter.detect(&mnist_sequential()));
        assert!(!KerasAdapter.detect(&json!({ "name": "m", "layers": [] })));
        assert!(!KerasAdapter.detect(&json!({ "class_name": "Dense", "config": {} })));
    }

    #[test]
    fn test_missing_layer_list() {
        let err = KerasAdapter
            .parse(&json!({ "class_name": "Sequential", "config": { "name": "m" } }))
            .unwrap_err();
        assert!(matches!(err, GraphError::InvalidManifest { .. }));
    }

    #[test]
    fn test_regularizer_captions() {
        let l1l2 = json!({ "class_name": "L1L2", "config": { "l1": 0.5, "l2": 0.25 } });
        assert_eq!(regularizer_caption(&l1l2).unwrap(), "L1-L2 - Elasticnet (0.5, 0.25)");
        let none = json!({ "class_name": "L1L2", "config": { "l1": 0.0, "l2": 0.0 } });
        assert_eq!(regularizer_caption(&none), None);
    }
}
