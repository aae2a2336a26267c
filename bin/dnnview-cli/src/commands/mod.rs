// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Subcommand implementations and shared helpers.

pub mod diff;
pub mod epochs;
pub mod inspect;
pub mod layout;
pub mod search;

use anyhow::Context;
use model_graph::{BuildOutput, ModelLoader};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` wins over `-v` flags.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Builds `path`. The builder has already logged each warning.
pub(crate) fn build(path: &Path) -> anyhow::Result<BuildOutput> {
    ModelLoader::build(path)
        .with_context(|| format!("failed to load model from '{}'", path.display()))
}

/// Builds `path` on the blocking thread pool.
pub(crate) async fn build_blocking(path: PathBuf) -> anyhow::Result<BuildOutput> {
    tokio::task::spawn_blocking(move || build(&path))
        .await
        .context("model build task panicked")?
}

/// Prints the boxed command banner.
pub(crate) fn banner(title: &str) {
    let inner: usize = 54;
    let text = format!("dnnview · {title}");
    let pad = inner.saturating_sub(text.chars().count());
    let left = pad / 2;
    println!("╔{}╗", "═".repeat(inner));
    println!("║{}{}{}║", " ".repeat(left), text, " ".repeat(pad - left));
    println!("╚{}╝", "═".repeat(inner));
    println!();
}

/// Truncates `s` to `max_len` characters with an ellipsis.
pub(crate) fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{head}...")
    }
}
