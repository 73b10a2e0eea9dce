//! Codec benchmarks for roata-protocol.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use roata_protocol::{codec, Event, TelemetryEvent};

fn telemetry_payload() -> (String, bytes::Bytes) {
    let event = Event::Telemetry(
        TelemetryEvent::new("30", "T1", 47.0, 28.8, 90.0, 20.0).with_board("3913"),
    );
    codec::encode(&event).unwrap()
}

fn bench_decode_telemetry(c: &mut Criterion) {
    let (topic, payload) = telemetry_payload();

    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Bytes(payload.len() as u64));
    group.bench_function("telemetry", |b| {
        b.iter(|| codec::decode(black_box(&topic), black_box(&payload)))
    });
    group.finish();
}

fn bench_decode_rejects(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_reject");
    group.bench_function("malformed", |b| {
        b.iter(|| codec::decode(black_box("telemetry/route/30"), black_box(b"{\"tracker")))
    });
    group.bench_function("unknown_topic", |b| {
        b.iter(|| codec::decode(black_box("weather/today"), black_box(b"{}")))
    });
    group.finish();
}

criterion_group!(benches, bench_decode_telemetry, bench_decode_rejects);
criterion_main!(benches);
