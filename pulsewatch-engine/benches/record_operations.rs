use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pulsewatch_engine::{Engine, EngineConfig, Tags};
use tokio::runtime::Runtime;

/// Benchmark record_metric latency on a single series (hot path)
fn bench_record_single_series(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let engine = Engine::builder().build().unwrap();

    c.bench_function("record_single_series", |b| {
        b.to_async(&rt).iter(|| async {
            engine
                .record_metric(black_box("response_time"), black_box(120.0), "api", Tags::new())
                .await
                .unwrap();
        });
    });
}

/// Benchmark recording with tags attached
fn bench_record_tagged(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let engine = Engine::builder().build().unwrap();
    let mut tags = Tags::new();
    tags.insert("region".to_string(), "eu-west-1".to_string());
    tags.insert("host".to_string(), "api-7".to_string());

    c.bench_function("record_tagged", |b| {
        b.to_async(&rt).iter(|| async {
            engine
                .record_metric("cpu_usage", black_box(42.0), "api", tags.clone())
                .await
                .unwrap();
        });
    });
}

/// Benchmark recording spread across many series
fn bench_record_many_series(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_many_series");
    let rt = Runtime::new().unwrap();

    for series_count in [1usize, 10, 100].iter() {
        let engine = Engine::builder().build().unwrap();
        let names: Vec<String> = (0..*series_count).map(|i| format!("metric_{i}")).collect();

        group.bench_with_input(
            BenchmarkId::from_parameter(series_count),
            series_count,
            |b, _| {
                b.to_async(&rt).iter(|| async {
                    for name in &names {
                        engine
                            .record_metric(black_box(name), 1.0, "bench", Tags::new())
                            .await
                            .unwrap();
                    }
                });
            },
        );
    }
    group.finish();
}

/// Benchmark ring buffer reads with varying limits
fn bench_recent_values(c: &mut Criterion) {
    let mut group = c.benchmark_group("recent_values");
    let rt = Runtime::new().unwrap();
    let engine = Engine::builder()
        .config(EngineConfig::builder().ring_buffer_capacity(1000).build())
        .build()
        .unwrap();
    rt.block_on(async {
        for i in 0..1000 {
            engine
                .record_metric("throughput", i as f64, "api", Tags::new())
                .await
                .unwrap();
        }
    });

    for limit in [1usize, 10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(limit), limit, |b, &limit| {
            b.iter(|| engine.recent_values("api", "throughput", black_box(limit)));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_record_single_series,
    bench_record_tagged,
    bench_record_many_series,
    bench_recent_values,
);
criterion_main!(benches);
