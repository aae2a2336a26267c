// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Keyed store of built and laid-out models.
//!
//! Each entry remembers the fingerprint of the records it was built from.
//! A lookup with different records (the model file changed and was read
//! again) rebuilds the entry in place. Entries can also be dropped with
//! [`ModelCache::invalidate`].
//!
//! # Thread Safety
//! `ModelCache` is `Send + Sync` and can be shared via `Arc<ModelCache>`.
//! The lock is not held while a model is built or laid out, so two
//! callers missing on the same key may both build it; the last insert wins.

use crate::{LayoutEngine, LayoutRecord};
use model_graph::{BuildWarning, Built, GraphBuilder, GraphError, ModelGraph, ModelLoader, ModelRecords};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// One cached model: graph, build warnings and layout.
#[derive(Debug)]
pub struct CachedModel {
    pub fingerprint: u64,
    pub graph: ModelGraph<Built>,
    pub warnings: Vec<BuildWarning>,
    pub layout: LayoutRecord,
}

/// Cumulative lookup statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Misses that replaced an entry with a stale fingerprint.
    pub rebuilds: u64,
    pub invalidations: u64,
}

impl CacheStats {
    /// Fraction of lookups served from the cache, `0.0` before any lookup.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64
    }

    pub fn summary(&self) -> String {
        format!(
            "Lookups: {} ({} hits, {} misses, {:.0}% hit rate), {} rebuilds, {} invalidations",
            self.hits + self.misses,
            self.hits,
            self.misses,
            self.hit_ratio() * 100.0,
            self.rebuilds,
            self.invalidations,
        )
    }
}

/// Built graphs and layouts keyed by source.
///
/// # Example
/// ```no_run
/// use graph_layout::{LayoutEngine, ModelCache};
/// use std::path::Path;
///
/// let cache = ModelCache::new(LayoutEngine::default());
/// let model = cache.load(Path::new("./models/tiny-cnn")).unwrap();
/// println!("{} node(s), {} warning(s)", model.graph.len(), model.warnings.len());
/// // Served from the cache while the file is unchanged.
/// let again = cache.load(Path::new("./models/tiny-cnn")).unwrap();
/// assert_eq!(model.fingerprint, again.fingerprint);
/// ```
pub struct ModelCache {
    engine: LayoutEngine,
    builder: GraphBuilder,
    entries: Mutex<HashMap<String, Arc<CachedModel>>>,
    stats: Mutex<CacheStats>,
}

impl ModelCache {
    pub fn new(engine: LayoutEngine) -> Self {
        Self::with_builder(engine, GraphBuilder::new())
    }

    pub fn with_builder(engine: LayoutEngine, builder: GraphBuilder) -> Self {
        Self {
            engine,
            builder,
            entries: Mutex::new(HashMap::new()),
            stats: Mutex::new(CacheStats::default()),
        }
    }

    pub fn engine(&self) -> &LayoutEngine {
        &self.engine
    }

    /// The entry for `key` if it was built from `records`; otherwise
    /// builds, lays out, pins and stores a fresh one.
    pub fn get_or_build(&self, key: &str, records: &ModelRecords) -> Result<Arc<CachedModel>, GraphError> {
        let fingerprint = records.fingerprint();
        let stale = match self.get(key) {
            Some(entry) if entry.fingerprint == fingerprint => {
                self.record(|s| s.hits += 1);
                tracing::debug!("cache hit for '{key}'");
                return Ok(entry);
            }
            Some(_) => true,
            None => false,
        };

        self.record(|s| {
            s.misses += 1;
            if stale {
                s.rebuilds += 1;
            }
        });
        if stale {
            tracing::info!("'{key}' changed since it was cached, rebuilding");
        }

        let out = self.builder.build(records)?;
        let layout = self.engine.compute(&out.graph);
        layout.pin(&out.graph);
        let entry = Arc::new(CachedModel {
            fingerprint,
            graph: out.graph,
            warnings: out.warnings,
            layout,
        });
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), Arc::clone(&entry));
        }
        Ok(entry)
    }

    /// Reads `source` and returns its cached entry, rebuilding if the
    /// file's content changed.
    pub fn load(&self, source: &Path) -> Result<Arc<CachedModel>, GraphError> {
        let records = ModelLoader::load(source)?;
        let key = ModelLoader::resolve(source).display().to_string();
        self.get_or_build(&key, &records)
    }

    /// The current entry for `key`, without checking freshness.
    pub fn get(&self, key: &str) -> Option<Arc<CachedModel>> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    /// Drops the entry for `key`; `true` if there was one.
    pub fn invalidate(&self, key: &str) -> bool {
        let removed = self
            .entries
            .lock()
            .map(|mut entries| entries.remove(key).is_some())
            .unwrap_or(false);
        if removed {
            self.record(|s| s.invalidations += 1);
        }
        removed
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.lock().map(|s| *s).unwrap_or_default()
    }

    fn record(&self, update: impl FnOnce(&mut CacheStats)) {
        if let Ok(mut stats) = self.stats.lock() {
            update(&mut stats);
        }
    }
}
