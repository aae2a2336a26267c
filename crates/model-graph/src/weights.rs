// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Weight statistics from a SafeTensors file.
//!
//! The file is memory-mapped; only the tensors asked for are decoded, one
//! pass each. Tensors belong to a node when their name starts with the
//! node name followed by `.` or `/` (`conv1.weight`, `dense/kernel:0`).

use crate::GraphError;
use half::{bf16, f16};
use shape_algebra::{DType, Shape};
use std::fmt;
use std::path::{Path, PathBuf};

/// Shape and element type of one stored tensor.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct WeightMeta {
    pub name: String,
    pub shape: Shape,
    pub dtype: DType,
    pub size_bytes: usize,
}

/// Summary statistics of a floating-point tensor.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Summary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
}

impl Summary {
    /// Welford's single-pass mean and variance. `None` for no values.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut count = 0u64;
        let (mut mean, mut m2) = (0.0f64, 0.0f64);
        let (mut min, mut max) = (f64::INFINITY, f64::NEG_INFINITY);
        for v in values {
            count += 1;
            let delta = v - mean;
            mean += delta / count as f64;
            m2 += delta * (v - mean);
            min = min.min(v);
            max = max.max(v);
        }
        (count > 0).then(|| Self {
            min,
            max,
            mean,
            std: (m2 / count as f64).sqrt(),
        })
    }
}

/// Statistics for one tensor; `summary` is `None` for non-float or empty
/// tensors.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct WeightStats {
    pub meta: WeightMeta,
    pub summary: Option<Summary>,
}

impl fmt::Display for WeightStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.meta.name, self.meta.shape, self.meta.dtype)?;
        if let Some(s) = &self.summary {
            write!(
                f,
                "  min {:.4} max {:.4} mean {:.4} std {:.4}",
                s.min, s.max, s.mean, s.std
            )?;
        }
        Ok(())
    }
}

/// A memory-mapped SafeTensors file.
pub struct WeightFile {
    path: PathBuf,
    mmap: memmap2::Mmap,
}

impl WeightFile {
    /// Maps `path` and checks that its header parses.
    pub fn open(path: &Path) -> Result<Self, GraphError> {
        let file = std::fs::File::open(path).map_err(|e| {
            GraphError::SafeTensors(format!("cannot open '{}': {e}", path.display()))
        })?;

        // Memory-map the file; only touched pages are read.
        let mmap = unsafe { memmap2::Mmap::map(&file) }
            .map_err(|e| GraphError::SafeTensors(format!("mmap failed: {e}")))?;

        let weights = Self {
            path: path.to_path_buf(),
            mmap,
        };
        weights.tensors()?;
        Ok(weights)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse(&self) -> Result<safetensors::SafeTensors<'_>, GraphError> {
        safetensors::SafeTensors::deserialize(&self.mmap)
            .map_err(|e| GraphError::SafeTensors(format!("SafeTensors parse error: {e}")))
    }

    /// Metadata of every tensor, sorted by name.
    pub fn tensors(&self) -> Result<Vec<WeightMeta>, GraphError> {
        let st = self.parse()?;
        let mut metas = st
            .tensors()
            .into_iter()
            .map(|(name, view)| meta_of(name, &view))
            .collect::<Result<Vec<_>, _>>()?;
        metas.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(metas)
    }

    /// Decodes one tensor and summarises it.
    pub fn stats(&self, name: &str) -> Result<WeightStats, GraphError> {
        let st = self.parse()?;
        let view = st
            .tensor(name)
            .map_err(|e| GraphError::SafeTensors(format!("tensor '{name}': {e}")))?;
        let meta = meta_of(name.to_string(), &view)?;
        let summary = summarize(meta.dtype, view.data());
        Ok(WeightStats { meta, summary })
    }

    /// Statistics of every tensor belonging to `node`, sorted by name.
    pub fn stats_for_node(&self, node: &str) -> Result<Vec<WeightStats>, GraphError> {
        let names: Vec<String> = self
            .tensors()?
            .into_iter()
            .map(|m| m.name)
            .filter(|n| belongs_to(n, node))
            .collect();
        names.iter().map(|n| self.stats(n)).collect()
    }
}

impl fmt::Debug for WeightFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeightFile")
            .field("path", &self.path)
            .field("bytes", &self.mmap.len())
            .finish()
    }
}

fn belongs_to(tensor: &str, node: &str) -> bool {
    tensor
        .strip_prefix(node)
        .is_some_and(|rest| rest.starts_with('.') || rest.starts_with('/'))
}

fn meta_of(name: String, view: &safetensors::tensor::TensorView<'_>) -> Result<WeightMeta, GraphError> {
    let shape = Shape::known(view.shape());
    let dtype = convert_safetensor_dtype(view.dtype())?;
    Ok(WeightMeta {
        name,
        shape,
        dtype,
        size_bytes: view.data().len(),
    })
}

/// Little-endian decode of float tensors; other dtypes are not summarised.
fn summarize(dtype: DType, data: &[u8]) -> Option<Summary> {
    match dtype {
        DType::F32 => Summary::from_values(
            data.chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]) as f64),
        ),
        DType::F64 => Summary::from_values(data.chunks_exact(8).map(|c| {
            f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]])
        })),
        DType::F16 => Summary::from_values(
            data.chunks_exact(2)
                .map(|c| f16::from_le_bytes([c[0], c[1]]).to_f64()),
        ),
        DType::BF16 => Summary::from_values(
            data.chunks_exact(2)
                .map(|c| bf16::from_le_bytes([c[0], c[1]]).to_f64()),
        ),
        _ => None,
    }
}

/// Converts a SafeTensors `Dtype` to our [`DType`].
fn convert_safetensor_dtype(st_dtype: safetensors::Dtype) -> Result<DType, GraphError> {
    match st_dtype {
        safetensors::Dtype::F32 => Ok(DType::F32),
        safetensors::Dtype::F64 => Ok(DType::F64),
        safetensors::Dtype::F16 => Ok(DType::F16),
        safetensors::Dtype::BF16 => Ok(DType::BF16),
        safetensors::Dtype::I8 => Ok(DType::I8),
        safetensors::Dtype::U8 => Ok(DType::U8),
        safetensors::Dtype::I32 => Ok(DType::I32),
        safetensors::Dtype::I64 => Ok(DType::I64),
        safetensors::Dtype::BOOL => Ok(DType::Bool),
        other => Err(GraphError::SafeTensors(format!(
            "unsupported SafeTensors dtype: {other:?}"
        ))),
    }
}
