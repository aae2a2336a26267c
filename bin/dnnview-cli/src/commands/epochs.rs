// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `dnnview epochs` command: checkpoints of a training run.
//!
//! With a pattern (`runs/mnist_{epoch}.json`) it lists the checkpoints in
//! epoch order, optionally diffing each one against its predecessor. With
//! a directory it lists the models found there, sequences collapsed to
//! their pattern.

use super::diff::print_report;
use super::{banner, build_blocking};
use graph_query::diff;
use model_graph::adapters::{list_models, ModelSequence};
use std::path::{Path, PathBuf};

pub async fn execute(source: String, sequence_pattern: String, with_diff: bool) -> anyhow::Result<()> {
    banner("Checkpoints");

    if Path::new(&source).is_dir() {
        let models = list_models(&[PathBuf::from(&source)], &sequence_pattern);
        println!("  {} model(s) in '{source}':", models.len());
        for model in &models {
            let pattern = model.display().to_string();
            let count = ModelSequence::open(&pattern).map(|s| s.len()).unwrap_or(0);
            println!("   {pattern}  ({count} checkpoint(s))");
        }
        return Ok(());
    }

    let sequence = ModelSequence::open(&source)?;
    if sequence.is_empty() {
        anyhow::bail!("no checkpoints match '{source}'");
    }
    println!("  {}: {} checkpoint(s)", sequence.title(), sequence.len());
    for checkpoint in sequence.checkpoints() {
        println!("   epoch {:>4}  {}", checkpoint.epoch, checkpoint.path.display());
    }
    println!();

    if !with_diff {
        return Ok(());
    }
    let mut previous = None;
    for checkpoint in sequence.checkpoints() {
        let current = build_blocking(checkpoint.path.clone()).await?;
        if let Some((epoch, prev)) = previous.take() {
            println!("  epoch {epoch} → {}", checkpoint.epoch);
            print_report(&diff(&prev, &current.graph));
            println!();
        }
        previous = Some((checkpoint.epoch, current.graph));
    }
    Ok(())
}
