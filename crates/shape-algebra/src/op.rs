// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Operator kinds.
//!
//! Every framework layer is normalized to one [`OpKind`]. Attribute
//! differences between kinds live in the attribute map, so shape inference
//! stays a flat `match` over this enum.

use std::fmt;

/// How a pooling layer reduces its window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolMode {
    Max,
    Average,
    /// Reduces every spatial axis.
    GlobalMax,
    GlobalAverage,
}

impl PoolMode {
    pub fn is_global(self) -> bool {
        matches!(self, PoolMode::GlobalMax | PoolMode::GlobalAverage)
    }
}

/// How a merge layer combines its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeMode {
    Concat,
    Add,
    Multiply,
}

/// The kind of computation a node performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    /// Graph input placeholder.
    Input,
    /// Graph output marker.
    Output,
    /// N-d convolution.
    Convolution,
    /// Fully connected projection on the last axis.
    Dense,
    /// Batch / layer / group normalization.
    Normalization,
    /// Element-wise activation.
    Activation,
    Pooling(PoolMode),
    Merge(MergeMode),
    /// Collapses every non-batch axis into one.
    Flatten,
    Dropout,
    /// Block wrapping a nested sub-graph, or a recurrent cell.
    Composite,
    /// Not in the vocabulary; kept for display, never shaped.
    Unknown,
}

impl OpKind {
    /// Parses a kind from an adapter tag.
    ///
    /// Accepts snake_case names and the common spellings of Keras,
    /// PyTorch and ONNX (`"Conv2D"`, `"linear"`, `"BatchNorm"`, `"cat"`).
    /// Returns `None` for tags outside the vocabulary.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        let tag: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();
        let kind = match tag.as_str() {
            "input" | "inputlayer" | "placeholder" => Self::Input,
            "output" | "outputlayer" => Self::Output,
            "conv" | "convolution" | "conv1d" | "conv2d" | "conv3d" | "separableconv2d"
            | "depthwiseconv2d" => Self::Convolution,
            "dense" | "linear" | "fc" | "gemm" | "fullyconnected" => Self::Dense,
            "normalization" | "batchnorm" | "batchnormalization" | "batchnorm2d"
            | "layernorm" | "layernormalization" | "groupnorm" | "instancenorm" => {
                Self::Normalization
            }
            "activation" | "relu" | "relu6" | "leakyrelu" | "prelu" | "elu" | "selu"
            | "gelu" | "sigmoid" | "tanh" | "softmax" | "swish" | "silu" => Self::Activation,
            "maxpool" | "maxpool2d" | "maxpooling1d" | "maxpooling2d" | "maxpooling3d" => {
                Self::Pooling(PoolMode::Max)
            }
            "avgpool" | "avgpool2d" | "averagepool" | "averagepooling1d"
            | "averagepooling2d" | "averagepooling3d" => Self::Pooling(PoolMode::Average),
            "globalmaxpool" | "globalmaxpooling1d" | "globalmaxpooling2d"
            | "globalmaxpooling3d" => Self::Pooling(PoolMode::GlobalMax),
            "globalavgpool" | "globalaveragepool" | "adaptiveavgpool"
            | "globalaveragepooling1d" | "globalaveragepooling2d"
            | "globalaveragepooling3d" => Self::Pooling(PoolMode::GlobalAverage),
            "concat" | "concatenate" | "cat" => Self::Merge(MergeMode::Concat),
            "add" | "sum" | "residual" => Self::Merge(MergeMode::Add),
            "mul" | "multiply" => Self::Merge(MergeMode::Multiply),
            "flatten" | "reshapeflat" => Self::Flatten,
            "dropout" | "spatialdropout1d" | "spatialdropout2d" | "spatialdropout3d" => {
                Self::Dropout
            }
            "composite" | "block" | "module" | "sequential" | "functional" | "model"
            | "recurrent" | "loop" | "lstm" | "gru" | "simplernn" | "rnn" => Self::Composite,
            "unknown" => Self::Unknown,
            _ => return None,
        };
        Some(kind)
    }

    /// Returns the canonical snake_case label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
            Self::Convolution => "convolution",
            Self::Dense => "dense",
            Self::Normalization => "normalization",
            Self::Activation => "activation",
            Self::Pooling(PoolMode::Max) => "max_pool",
            Self::Pooling(PoolMode::Average) => "avg_pool",
            Self::Pooling(PoolMode::GlobalMax) => "global_max_pool",
            Self::Pooling(PoolMode::GlobalAverage) => "global_avg_pool",
            Self::Merge(MergeMode::Concat) => "concat",
            Self::Merge(MergeMode::Add) => "add",
            Self::Merge(MergeMode::Multiply) => "multiply",
            Self::Flatten => "flatten",
            Self::Dropout => "dropout",
            Self::Composite => "composite",
            Self::Unknown => "unknown",
        }
    }

    /// Coarse family name, used by search filters (`kind:pooling`).
    pub fn family(&self) -> &'static str {
        match self {
            Self::Pooling(_) => "pooling",
            Self::Merge(_) => "merge",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
