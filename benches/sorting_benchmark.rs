use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use heapcascade::prelude::*;
use rand::Rng;
use std::hint::black_box;

fn configs() -> Vec<(String, HeapSortConfig)> {
    let mut configs = Vec::new();
    for strategy in [Strategy::Straight, Strategy::AheadSimple, Strategy::Cascading] {
        for arity in [2, 4, 8] {
            for layout in [
                Layout::Flat,
                Layout::Clustered { levels: 4 },
                Layout::Rootless { levels: 3 },
            ] {
                let config = HeapSortConfig::new()
                    .arity(arity)
                    .layout(layout)
                    .strategy(strategy);
                configs.push((format!("{strategy}/k{arity}/{layout}"), config));
            }
        }
        let hybrid = HeapSortConfig::new()
            .arity(3)
            .layout(Layout::Hybrid { levels: 8 })
            .strategy(strategy);
        configs.push((format!("{strategy}/hybrid:8"), hybrid));
    }
    configs.push((
        "cached".to_string(),
        HeapSortConfig::new().strategy(Strategy::Cached),
    ));
    configs.push(("pipelined".to_string(), HeapSortConfig::new()));
    configs
}

fn bench_integers(c: &mut Criterion) {
    let mut group = c.benchmark_group("Integer Heap Sort");
    group.sample_size(10);

    // Dataset generation
    let mut rng = rand::rng();
    let count = 100_000;
    let random: Vec<u64> = (0..count).map(|_| rng.random()).collect();

    for (name, config) in configs() {
        let sorter = HeapSorter::new(config).unwrap();
        group.bench_function(name, |b| {
            b.iter_batched(
                || random.clone(),
                |mut data| sorter.sort(black_box(&mut data)),
                BatchSize::SmallInput,
            )
        });
    }

    // Std Sort Unstable
    group.bench_function("slice::sort_unstable", |b| {
        b.iter_batched(
            || random.clone(),
            |mut data| data.sort_unstable(),
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

fn bench_few_distinct(c: &mut Criterion) {
    let mut group = c.benchmark_group("Few Distinct Keys");
    group.sample_size(10);

    let mut rng = rand::rng();
    let count = 100_000;
    let input: Vec<u32> = (0..count).map(|_| rng.random_range(0..16)).collect();

    for strategy in [Strategy::AheadSimple, Strategy::Cached, Strategy::Pipelined] {
        let sorter = HeapSorter::new(HeapSortConfig::new().strategy(strategy)).unwrap();
        group.bench_function(strategy.name(), |b| {
            b.iter_batched(
                || input.clone(),
                |mut data| sorter.sort(black_box(&mut data)),
                BatchSize::SmallInput,
            )
        });
    }

    group.bench_function("slice::sort_unstable", |b| {
        b.iter_batched(
            || input.clone(),
            |mut data| data.sort_unstable(),
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_integers, bench_few_distinct);
criterion_main!(benches);
