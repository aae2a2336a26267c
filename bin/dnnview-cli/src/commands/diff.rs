// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `dnnview diff` command: structural comparison of two models.
//!
//! Both sides are built concurrently on the blocking pool; graphs share
//! no state, so no synchronisation is needed.

use super::build_blocking;
use graph_query::{diff, DiffReport};
use std::path::PathBuf;

pub async fn execute(before: PathBuf, after: PathBuf, json: bool) -> anyhow::Result<()> {
    let (a, b) = tokio::try_join!(build_blocking(before.clone()), build_blocking(after.clone()))?;
    let report = diff(&a.graph, &b.graph);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("  {} → {}", before.display(), after.display());
        print_report(&report);
    }
    Ok(())
}

pub(crate) fn print_report(report: &DiffReport) {
    println!("  {}", report.summary());
    for name in &report.added {
        println!("   + {name}");
    }
    for name in &report.removed {
        println!("   - {name}");
    }
    for (name, changes) in &report.changed {
        let changes: Vec<&str> = changes.iter().map(String::as_str).collect();
        println!("   ~ {name}: {}", changes.join(", "));
    }
}
