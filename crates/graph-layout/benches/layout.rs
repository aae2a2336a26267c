// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmarks for layout computation.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use graph_layout::{LayoutConfig, LayoutEngine};
use model_graph::{Built, GraphBuilder, LayerRecord, ModelGraph};

/// A residual network: `blocks` dense/relu pairs, each summed with its
/// block input.
fn residual(blocks: usize) -> ModelGraph<Built> {
    let mut records = vec![LayerRecord::new("x", "input").with_input_shape(vec![1usize, 64])];
    let mut prev = "x".to_string();
    for b in 0..blocks {
        let fc = format!("fc{b}");
        let act = format!("act{b}");
        let sum = format!("sum{b}");
        records.push(LayerRecord::new(&fc, "dense").with_inputs([prev.clone()]).with_attr("units", 64usize));
        records.push(LayerRecord::new(&act, "relu").with_inputs([fc]));
        records.push(LayerRecord::new(&sum, "add").with_inputs([act, prev]));
        prev = sum;
    }
    GraphBuilder::new()
        .build_records("residual", &records)
        .map(|out| out.graph)
        .unwrap_or_else(|e| panic!("benchmark graph failed to build: {e}"))
}

fn bench_compute(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute");
    for blocks in [8, 64, 256] {
        let graph = residual(blocks);
        let engine = LayoutEngine::new(LayoutConfig::default());
        group.bench_with_input(BenchmarkId::from_parameter(graph.len()), &graph, |b, g| {
            b.iter(|| engine.compute(g))
        });
    }
    group.finish();
}

fn bench_crossing_passes(c: &mut Criterion) {
    let graph = residual(64);
    let mut group = c.benchmark_group("max_passes");
    for passes in [0, 4, 24] {
        let engine = LayoutEngine::new(LayoutConfig {
            max_passes: passes,
            ..Default::default()
        });
        group.bench_with_input(BenchmarkId::from_parameter(passes), &graph, |b, g| {
            b.iter(|| engine.compute(g))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_compute, bench_crossing_passes);
criterion_main!(benches);
