// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Checkpoint sequences: one model file per training epoch.
//!
//! A sequence is named by a path pattern whose file name contains an
//! `{epoch}` tag, e.g. `runs/mnist_{epoch}.json`. Every file in the
//! pattern's directory where the tag matches a run of digits belongs to
//! the sequence.

use crate::GraphError;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

const EPOCH_TAG: &str = "{epoch}";
const MODEL_TAG: &str = "{model}";

/// One checkpoint of a sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    pub epoch: u64,
    pub path: PathBuf,
}

/// Model files ordered by epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSequence {
    title: String,
    checkpoints: Vec<Checkpoint>,
}

impl ModelSequence {
    /// A sequence of one file, reported as epoch 0.
    pub fn single(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            title: path.display().to_string(),
            checkpoints: vec![Checkpoint { epoch: 0, path }],
        }
    }

    /// Finds every checkpoint matching `pattern`.
    ///
    /// The `{epoch}` tag must appear exactly once and only in the file
    /// name. When two files resolve to the same epoch (`m_3` and `m_03`)
    /// the lexically first one wins.
    pub fn discover(pattern: &str) -> Result<Self, GraphError> {
        let path = Path::new(pattern);
        let file_pattern = path
            .file_name()
            .and_then(|f| f.to_str())
            .filter(|f| f.matches(EPOCH_TAG).count() == 1)
            .ok_or_else(|| GraphError::InvalidManifest {
                detail: format!("pattern '{pattern}' needs one {EPOCH_TAG} tag in its file name"),
            })?;
        let (prefix, suffix) = file_pattern
            .split_once(EPOCH_TAG)
            .unwrap_or((file_pattern, ""));
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut files: Vec<(String, PathBuf)> = std::fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().to_str()?.to_string();
                Some((name, entry.path()))
            })
            .collect();
        files.sort();

        let mut by_epoch: BTreeMap<u64, PathBuf> = BTreeMap::new();
        for (name, path) in files {
            if let Some(epoch) = match_epoch(&name, prefix, suffix) {
                by_epoch.entry(epoch).or_insert(path);
            }
        }
        tracing::info!("found {} checkpoint(s) for '{pattern}'", by_epoch.len());

        Ok(Self {
            title: pattern.to_string(),
            checkpoints: by_epoch
                .into_iter()
                .map(|(epoch, path)| Checkpoint { epoch, path })
                .collect(),
        })
    }

    /// Opens `source` as a pattern if it carries an `{epoch}` tag,
    /// otherwise as a single file.
    pub fn open(source: &str) -> Result<Self, GraphError> {
        if source.contains(EPOCH_TAG) {
            Self::discover(source)
        } else {
            Ok(Self::single(source))
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }

    /// Checkpoints in increasing epoch order.
    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    pub fn epochs(&self) -> impl Iterator<Item = u64> + '_ {
        self.checkpoints.iter().map(|c| c.epoch)
    }

    pub fn path_for(&self, epoch: u64) -> Option<&Path> {
        self.checkpoints
            .iter()
            .find(|c| c.epoch == epoch)
            .map(|c| c.path.as_path())
    }

    pub fn first(&self) -> Option<&Checkpoint> {
        self.checkpoints.first()
    }

    pub fn last(&self) -> Option<&Checkpoint> {
        self.checkpoints.last()
    }
}

fn match_epoch(name: &str, prefix: &str, suffix: &str) -> Option<u64> {
    let digits = name.strip_prefix(prefix)?.strip_suffix(suffix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Lists the models found in `directories`, sorted.
///
/// Plain `.json` model files are listed as-is. Files matching
/// `sequence_pattern` (a file-name pattern with `{model}` and `{epoch}`
/// tags, e.g. `{model}_{epoch}.json`) are collapsed into one pattern
/// path per model, ready for [`ModelSequence::discover`]. Unreadable
/// directories are skipped with a warning.
pub fn list_models(directories: &[PathBuf], sequence_pattern: &str) -> Vec<PathBuf> {
    let mut models = BTreeSet::new();
    for dir in directories {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("failed to list '{}': {e}", dir.display());
                continue;
            }
        };
        for entry in entries.filter_map(|e| e.ok()) {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            match sequence_model(&name, sequence_pattern) {
                Some(model) => {
                    models.insert(dir.join(sequence_pattern.replace(MODEL_TAG, &model)));
                }
                None if name.ends_with(".json") => {
                    models.insert(entry.path());
                }
                None => {}
            }
        }
    }
    models.into_iter().collect()
}

/// The `{model}` part of `name` if it matches `pattern`.
fn sequence_model(name: &str, pattern: &str) -> Option<String> {
    let (before_model, rest) = pattern.split_once(MODEL_TAG)?;
    let (between, after_epoch) = rest.split_once(EPOCH_TAG)?;
    let middle = name.strip_prefix(before_model)?.strip_suffix(after_epoch)?;
    let (model, epoch) = middle.rsplit_once(between)?;
    let is_word = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_');
    if is_word(model) && !epoch.is_empty() && epoch.bytes().all(|b| b.is_ascii_digit()) {
        Some(model.to_string())
    } else {
        None
    }
}
