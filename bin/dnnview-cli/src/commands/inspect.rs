// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `dnnview inspect` command: display model structure and weight statistics.
//!
//! Builds the graph and prints a summary, the layers in topological order
//! with their inferred output shapes, the build warnings, and per-layer
//! weight statistics when a SafeTensors file is available.

use super::{banner, build, truncate};
use model_graph::adapters::activation_caption;
use model_graph::{Built, ModelGraph, ModelLoader, WeightFile};
use std::path::PathBuf;

pub async fn execute(model: PathBuf, weights: Option<PathBuf>) -> anyhow::Result<()> {
    banner("Model Inspector");

    let out = build(&model)?;
    let graph = &out.graph;

    // ── Summary ────────────────────────────────────────────────
    println!("  {}", graph.summary());
    let kinds: Vec<String> = graph
        .kind_histogram()
        .into_iter()
        .map(|(kind, count)| format!("{kind} ×{count}"))
        .collect();
    println!("  Kinds: {}", kinds.join(", "));
    println!();

    // ── Layers ─────────────────────────────────────────────────
    print_layers(graph, "");
    println!();

    // ── Warnings ───────────────────────────────────────────────
    if !out.warnings.is_empty() {
        println!("  Build warnings ({}):", out.warnings.len());
        for warning in &out.warnings {
            println!("   - {warning}");
        }
        println!();
    }

    // ── Weights ────────────────────────────────────────────────
    let Some(path) = weights.or_else(|| ModelLoader::weights_path(&model)) else {
        tracing::info!("no weight file next to '{}'", model.display());
        return Ok(());
    };
    let file = WeightFile::open(&path)
        .map_err(|e| anyhow::anyhow!("failed to open weights '{}': {e}", path.display()))?;

    println!("  Weights: {}", path.display());
    for node in graph.nodes() {
        let stats = file.stats_for_node(node.name())?;
        if stats.is_empty() {
            continue;
        }
        println!("   {}", node.name());
        for s in &stats {
            println!("     {s}");
        }
    }
    println!();
    Ok(())
}

fn print_layers(graph: &ModelGraph<Built>, indent: &str) {
    println!(
        "  {indent}{:<4} {:<28} {:<20} {:<22} {}",
        "Idx", "Name", "Kind", "Output", "Inputs",
    );
    println!("  {indent}{}", "-".repeat(90));

    for &id in graph.topological_order() {
        let node = graph.node(id);
        let shape = match &node.output_fact().shape {
            Some(shape) => shape.to_string(),
            None => "?".to_string(),
        };
        let inputs: Vec<&str> = graph.predecessors(id).map(|n| n.name()).collect();
        println!(
            "  {indent}{:<4} {:<28} {:<20} {:<22} {}",
            id.index(),
            truncate(node.name(), 28),
            truncate(node.source_kind(), 20),
            truncate(&shape, 22),
            inputs.join(", "),
        );

        if let Some(caption) = node
            .attributes()
            .get("activation")
            .and_then(|v| v.as_str())
            .and_then(activation_caption)
        {
            println!("  {indent}     └ activation: {caption}");
        }
        if node.is_recurrent() {
            println!("  {indent}     └ recurrent");
        }
        if let Some(body) = node.subgraph() {
            print_layers(body, &format!("{indent}      "));
        }
    }
}
