// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for `understory_auto_box` resolution passes.

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use understory_auto_box::{BOX_TAG, BoxNode, ElementRegistry, NodeId, Runtime};
use understory_box_style::{DefaultCalculators, Sty, StyleProp, commit};

fn runtime() -> Runtime {
    let mut registry = ElementRegistry::new();
    BoxNode::register(&mut registry).unwrap();
    Runtime::new(registry)
}

/// A root box with `width` children, each holding `depth` nested boxes.
fn build(width: usize, depth: usize) -> (Runtime, NodeId) {
    let mut rt = runtime();
    let root = rt.document().root();
    let top = rt.create_element(BOX_TAG);
    rt.set_attribute(top, "sty", r#"{ "axis": "row", "pad": 4, "gap": 2 }"#)
        .unwrap();
    rt.append_child(root, top).unwrap();
    for i in 0..width {
        let mut parent = top;
        for _ in 0..depth {
            let node = rt.create_element(BOX_TAG);
            if i % 2 == 0 {
                rt.set_attribute(node, "sty", r#"{ "width": { "grow": 1 } }"#)
                    .unwrap();
            }
            rt.append_child(parent, node).unwrap();
            parent = node;
        }
    }
    rt.flush().unwrap();
    (rt, top)
}

fn bench_attach(c: &mut Criterion) {
    let mut group = c.benchmark_group("auto_box/attach");
    for (width, depth) in [(8, 1), (32, 1), (8, 4)] {
        group.bench_function(BenchmarkId::new("tree", format!("{width}x{depth}")), |b| {
            b.iter(|| black_box(build(width, depth)));
        });
    }
    group.finish();
}

fn bench_propagation(c: &mut Criterion) {
    let mut group = c.benchmark_group("auto_box/propagate");
    group.bench_function("parent_padding_32", |b| {
        b.iter_batched(
            || build(32, 1),
            |(mut rt, top)| {
                rt.set_style(top, StyleProp::PaddingLeft, "9px").unwrap();
                black_box(rt.flush().unwrap())
            },
            BatchSize::SmallInput,
        );
    });
    group.bench_function("append_child_32", |b| {
        b.iter_batched(
            || build(32, 1),
            |(mut rt, top)| {
                let node = rt.create_element(BOX_TAG);
                rt.append_child(top, node).unwrap();
                black_box(rt.flush().unwrap())
            },
            BatchSize::SmallInput,
        );
    });
    group.bench_function("settled_flush", |b| {
        let (mut rt, _) = build(32, 4);
        b.iter(|| black_box(rt.flush().unwrap()));
    });
    group.finish();
}

fn bench_recompute(c: &mut Criterion) {
    let mut group = c.benchmark_group("auto_box/recompute");
    let (mut rt, top) = build(8, 1);
    group.bench_function("idempotent", |b| {
        b.iter(|| rt.with_element(top, |node: &mut BoxNode, cx| black_box(node.recompute(cx))));
    });

    let node = BoxNode::with_calculators(DefaultCalculators);
    group.bench_function("compute_style", |b| {
        b.iter(|| black_box(node.compute_style()));
    });

    let mut live = node.compute_style();
    let candidate = {
        let mut other = BoxNode::new();
        other.set_sty(Sty {
            pad: Some(3.0),
            ..Sty::default()
        });
        other.compute_style()
    };
    group.bench_function("commit_partial_diff", |b| {
        b.iter_batched(
            || live.clone(),
            |mut surface| black_box(commit(&candidate, &mut surface)),
            BatchSize::SmallInput,
        );
    });
    group.bench_function("commit_noop", |b| {
        b.iter(|| black_box(commit(&candidate, &mut live)));
    });
    group.finish();
}

criterion_group!(benches, bench_attach, bench_propagation, bench_recompute);
criterion_main!(benches);
