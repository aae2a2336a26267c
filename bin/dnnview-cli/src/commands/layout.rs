// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `dnnview layout` command: compute and emit the layout record.

use anyhow::Context;
use graph_layout::{LayoutConfig, LayoutEngine, ModelCache};
use std::path::PathBuf;

pub async fn execute(
    model: PathBuf,
    output: Option<PathBuf>,
    config: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config = match config {
        Some(path) => LayoutConfig::from_file(&path)?,
        None => LayoutConfig::default(),
    };

    let cache = ModelCache::new(LayoutEngine::new(config));
    let entry = cache
        .load(&model)
        .with_context(|| format!("failed to load model from '{}'", model.display()))?;
    for warning in &entry.warnings {
        tracing::warn!("{warning}");
    }
    entry.layout.validate(&entry.graph)?;

    let json = entry.layout.to_json()?;
    match output {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("cannot write '{}'", path.display()))?;
            let estimated = entry.layout.nodes.iter().filter(|n| n.estimated).count();
            println!(
                "  {} node(s) in {} rank(s), {} crossing(s) after {} pass(es), {} estimated → {}",
                entry.layout.nodes.len(),
                entry.layout.num_ranks(),
                entry.layout.crossings,
                entry.layout.passes,
                estimated,
                path.display(),
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}
