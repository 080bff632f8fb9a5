//! Superstep throughput benchmarks
//!
//! Runs each kernel over a synthetic power-law-ish graph so changes to the
//! gather/apply path show up as wall-clock regressions.
//!
//! ```bash
//! cargo bench --bench superstep_benchmark
//! cargo bench --bench superstep_benchmark -- pagerank
//! ```

use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use tokio::runtime::Runtime;

use bsp_graph::{
    Algorithm, GraphBuilder, LccConfig, PageRankConfig, PregelConfig, PregelRuntime, Topology,
    VertexId,
};

const SIZES: [usize; 2] = [1_000, 10_000];

/// Deterministic graph: every vertex links to a few hub-biased targets
fn synthetic_graph(n: usize) -> Arc<Topology> {
    let mut builder = GraphBuilder::new(n).with_partitions(16);
    builder.reserve(n * 8);
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    for src in 0..n {
        for _ in 0..8 {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let r = (state % n as u64) as usize;
            // squaring biases targets toward low ids
            let dst = r * r / n;
            builder
                .add_weighted_edge(VertexId(src as u32), VertexId(dst as u32), 1.0 + (r % 7) as f64)
                .unwrap();
        }
    }
    Arc::new(builder.build())
}

fn runtime() -> PregelRuntime {
    PregelRuntime::with_config(PregelConfig::default().with_tracing(false)).unwrap()
}

fn bench_algorithms(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let engine = runtime();

    let algorithms = [
        Algorithm::Bfs {
            source: VertexId(0),
        },
        Algorithm::Sssp {
            source: VertexId(0),
        },
        Algorithm::Wcc,
        Algorithm::Cdlp { iterations: 5 },
        Algorithm::PageRank(PageRankConfig {
            iterations: 10,
            ..PageRankConfig::default()
        }),
        Algorithm::Lcc(LccConfig::default()),
    ];

    for algorithm in &algorithms {
        let mut group = c.benchmark_group(algorithm.name());
        group.sample_size(10);
        for &n in &SIZES {
            let topology = synthetic_graph(n);
            group.bench_with_input(BenchmarkId::from_parameter(n), &topology, |b, topology| {
                b.to_async(&rt).iter(|| {
                    let engine = &engine;
                    let topology = Arc::clone(topology);
                    async move { algorithm.run(engine, topology).await.unwrap() }
                })
            });
        }
        group.finish();
    }
}

fn bench_lcc_intersection_strategy(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let engine = runtime();
    let topology = synthetic_graph(10_000);

    let mut group = c.benchmark_group("lcc_strategy");
    group.sample_size(10);
    for threshold in [0usize, 64, usize::MAX] {
        let algorithm = Algorithm::Lcc(LccConfig {
            bitmap_threshold: threshold,
        });
        group.bench_function(BenchmarkId::new("bitmap_threshold", threshold), |b| {
            b.to_async(&rt).iter(|| {
                let (engine, algorithm) = (&engine, &algorithm);
                let topology = Arc::clone(&topology);
                async move { algorithm.run(engine, topology).await.unwrap() }
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_algorithms, bench_lcc_intersection_strategy);
criterion_main!(benches);
