//! Benchmarks for trace decoding
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use simtrace_rs::{
    ByteOrder, EngineCollection, EngineStatsFile, EventTraceFile, FieldType, TraceDecoder,
};

fn event_trace(records: usize) -> Vec<u8> {
    let mut buf = Vec::with_capacity(records * 28);
    for i in 0..records {
        let t = i as f32 * 0.01;
        buf.extend_from_slice(&(i as u32 % 64).to_le_bytes());
        buf.extend_from_slice(&((i as u32 + 1) % 64).to_le_bytes());
        buf.extend_from_slice(&t.to_le_bytes());
        buf.extend_from_slice(&(t + 0.5).to_le_bytes());
        buf.extend_from_slice(&0.0f32.to_le_bytes());
        buf.extend_from_slice(&4u32.to_le_bytes());
        buf.extend_from_slice(&(i as i32 % 8).to_le_bytes());
    }
    buf
}

fn engine_trace(records: usize) -> Vec<u8> {
    let mut buf = Vec::new();
    for i in 0..records {
        let kind = EngineCollection::ALL[i % 3];
        let layout = kind.layout();
        buf.extend_from_slice(&1i32.to_le_bytes());
        buf.extend_from_slice(&(layout.size() as i32).to_le_bytes());
        buf.extend_from_slice(&(i as f64).to_le_bytes());
        buf.extend_from_slice(&(i as f64 / 100.0).to_le_bytes());
        for field in layout.fields() {
            match field.ty {
                FieldType::U32 => buf.extend_from_slice(&(i as u32).to_le_bytes()),
                _ => buf.extend_from_slice(&0.5f32.to_le_bytes()),
            }
        }
    }
    buf
}

fn bench_event_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("event_decode");

    for size in [1_000, 10_000, 100_000].iter() {
        let content = event_trace(*size);
        group.throughput(Throughput::Bytes(content.len() as u64));

        group.bench_with_input(BenchmarkId::new("table", size), &content, |b, content| {
            b.iter(|| {
                let mut trace = EventTraceFile::with_byte_order(content.clone(), ByteOrder::Little);
                trace.read();
                black_box(trace.frame().len())
            });
        });

        group.bench_with_input(BenchmarkId::new("records", size), &content, |b, content| {
            let trace = EventTraceFile::with_byte_order(content.clone(), ByteOrder::Little);
            b.iter(|| black_box(trace.records().count()));
        });
    }

    group.finish();
}

fn bench_engine_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_decode");

    for size in [1_000, 10_000].iter() {
        let content = engine_trace(*size);
        group.throughput(Throughput::Bytes(content.len() as u64));

        group.bench_with_input(BenchmarkId::from_parameter(size), &content, |b, content| {
            b.iter(|| {
                let mut stats = EngineStatsFile::from_bytes(content.clone()).unwrap();
                stats.read();
                black_box(stats.pe_frame().len())
            });
        });
    }

    group.finish();
}

fn bench_windowing(c: &mut Criterion) {
    let mut trace = EventTraceFile::with_byte_order(event_trace(100_000), ByteOrder::Little);
    trace.read();

    c.bench_function("window_quarter", |b| {
        b.iter(|| {
            trace.set_time_range(black_box(100.0), black_box(350.0));
            black_box(trace.network_frame().len())
        });
    });
}

criterion_group!(
    benches,
    bench_event_decode,
    bench_engine_decode,
    bench_windowing,
);

criterion_main!(benches);
