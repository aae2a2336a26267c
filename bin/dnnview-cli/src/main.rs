// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # dnnview
//!
//! Command-line interface for the model graph viewer core.
//!
//! ## Usage
//! ```bash
//! # Layer table, build warnings and weight statistics
//! dnnview inspect --model ./models/mnist
//!
//! # Layout record for a renderer
//! dnnview --config layout.toml layout --model ./models/mnist --output mnist.layout.json
//!
//! # Find nodes
//! dnnview search --model ./models/mnist "kind:convolution attr:filters=64"
//!
//! # Compare two versions of a model
//! dnnview diff runs/mnist_1.json runs/mnist_20.json
//!
//! # Checkpoints of a training run
//! dnnview epochs "runs/mnist_{epoch}.json" --diff
//! ```

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "dnnview",
    about = "Inspect, lay out, search and diff neural-network model graphs",
    version,
    author
)]
struct Cli {
    /// Path to a TOML layout configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the layer graph, inferred shapes, build warnings and weights.
    Inspect {
        /// Model JSON file or model directory.
        #[arg(short, long)]
        model: PathBuf,

        /// SafeTensors file (defaults to the one next to the model).
        #[arg(short, long)]
        weights: Option<PathBuf>,
    },

    /// Compute the layout record of a model.
    Layout {
        /// Model JSON file or model directory.
        #[arg(short, long)]
        model: PathBuf,

        /// Write the record here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List nodes matching a filter (name:, kind:, attr:key[=value]).
    Search {
        /// Model JSON file or model directory.
        #[arg(short, long)]
        model: PathBuf,

        /// Filter terms; all must match.
        query: String,

        /// Print matching names as a JSON array.
        #[arg(long)]
        json: bool,
    },

    /// Structural diff between two models.
    Diff {
        before: PathBuf,
        after: PathBuf,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List the checkpoints of an `{epoch}` pattern, or the models in a
    /// directory.
    Epochs {
        /// Pattern such as `runs/mnist_{epoch}.json`, or a directory.
        source: String,

        /// File-name pattern used to group a directory's checkpoints.
        #[arg(long, default_value = "{model}_{epoch}.json")]
        sequence_pattern: String,

        /// Diff each checkpoint against the previous one.
        #[arg(long)]
        diff: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    commands::init_tracing(cli.verbose);

    match cli.command {
        Commands::Inspect { model, weights } => commands::inspect::execute(model, weights).await,
        Commands::Layout { model, output } => {
            commands::layout::execute(model, output, cli.config).await
        }
        Commands::Search { model, query, json } => {
            commands::search::execute(model, query, json).await
        }
        Commands::Diff {
            before,
            after,
            json,
        } => commands::diff::execute(before, after, json).await,
        Commands::Epochs {
            source,
            sequence_pattern,
            diff,
        } => commands::epochs::execute(source, sequence_pattern, diff).await,
    }
}
