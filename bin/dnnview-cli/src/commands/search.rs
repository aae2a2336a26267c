// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `dnnview search` command: list nodes matching a filter.

use super::{build, truncate};
use graph_query::{search, NodeFilter};
use std::path::PathBuf;

pub async fn execute(model: PathBuf, query: String, json: bool) -> anyhow::Result<()> {
    let filter: NodeFilter = query.parse()?;
    let out = build(&model)?;
    let hits = search(&out.graph, |n| filter.matches(n));

    if json {
        let names: Vec<&str> = hits.names().collect();
        println!("{}", serde_json::to_string_pretty(&names)?);
        return Ok(());
    }

    println!("  {} match(es) for '{filter}' in '{}'", hits.count(), out.graph.name());
    for node in hits.iter() {
        let shape = node
            .output_fact()
            .shape
            .as_ref()
            .map_or_else(|| "?".to_string(), |s| s.to_string());
        println!(
            "   {:<28} {:<20} {}",
            truncate(node.name(), 28),
            truncate(node.source_kind(), 20),
            shape
        );
    }
    Ok(())
}
