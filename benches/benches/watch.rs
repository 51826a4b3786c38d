// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for `understory_watch` fan-out and batching.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use understory_watch::{MutationRecord, WatchOptions, WatchRegistry};

fn bench_notify(c: &mut Criterion) {
    let mut group = c.benchmark_group("watch/notify_drain");
    for watchers in [1_u32, 16, 128] {
        group.bench_function(BenchmarkId::from_parameter(watchers), |b| {
            let mut registry = WatchRegistry::<u32>::new();
            for target in 0..watchers {
                let w = registry.create();
                registry.observe(w, target, WatchOptions::attribute("style"));
                registry.observe(w, target + 1, WatchOptions::child_list());
            }
            b.iter(|| {
                for target in 0..watchers {
                    registry.notify(MutationRecord::attribute(target, "style"));
                    registry.notify(MutationRecord::child_list(target, [target + 1], []));
                }
                let mut delivered = 0;
                while let Some((_, batch)) = registry.take_batch() {
                    delivered += batch.len();
                }
                black_box(delivered)
            });
        });
    }
    group.finish();
}

fn bench_rearm(c: &mut Criterion) {
    // The per-child pattern: drop every target, then observe each child again.
    let mut group = c.benchmark_group("watch/rearm");
    for children in [4_u32, 64] {
        group.bench_function(BenchmarkId::from_parameter(children), |b| {
            let mut registry = WatchRegistry::<u32>::new();
            let w = registry.create();
            b.iter(|| {
                registry.disconnect(w);
                for child in 0..children {
                    registry.observe(w, child, WatchOptions::attribute("style"));
                }
                black_box(registry.is_observing(w, 0))
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_notify, bench_rearm);
criterion_main!(benches);
