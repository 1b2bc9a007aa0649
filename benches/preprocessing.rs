use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use tabprep::dataset::{Column, RawTable};
use tabprep::preprocessing::{LogSink, PipelineConfig, PreprocessingPipeline};

fn transactions(n: usize) -> RawTable {
    let channels = ["web", "pos", "atm", "phone"];
    RawTable::new(vec![
        Column::numeric(
            "amount",
            (0..n)
                .map(|i| if i % 13 == 0 { None } else { Some((i * 37 % 1009) as f64) })
                .collect(),
        ),
        Column::numeric(
            "age",
            (0..n).map(|i| Some(18.0 + (i % 60) as f64)).collect(),
        ),
        Column::text(
            "channel",
            (0..n)
                .map(|i| if i % 17 == 0 { None } else { Some(channels[i % 4]) })
                .collect(),
        ),
        Column::numeric(
            "fraud",
            (0..n).map(|i| Some(if i % 5 == 0 { 1.0 } else { 0.0 })).collect(),
        ),
    ])
    .unwrap()
}

fn bench_prepare(c: &mut Criterion) {
    let _ = env_logger::try_init();

    for size in [1_000, 10_000, 100_000].iter() {
        let raw = transactions(*size);
        c.bench_with_input(BenchmarkId::new("prepare", size), &raw, |b, raw| {
            b.iter(|| {
                let mut pipeline = PreprocessingPipeline::new(PipelineConfig::new("fraud"))
                    .with_sink(Arc::new(LogSink));
                let prepared = pipeline.prepare(black_box(raw)).unwrap();
                black_box(prepared);
            });
        });
    }
}

fn bench_transform(c: &mut Criterion) {
    for size in [1_000, 10_000, 100_000].iter() {
        let raw = transactions(*size);
        let mut pipeline = PreprocessingPipeline::new(PipelineConfig::new("fraud"));
        pipeline.fit(&raw).unwrap();

        c.bench_with_input(BenchmarkId::new("transform", size), &raw, |b, raw| {
            b.iter(|| {
                let features = pipeline.transform(black_box(raw)).unwrap();
                black_box(features);
            });
        });
    }
}

criterion_group!(benches, bench_prepare, bench_transform);
criterion_main!(benches);
