//! Codec hot-path benchmarks.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use loopguard_protocol::prelude::*;
use std::hint::black_box;

fn bench_observation(c: &mut Criterion) {
    let observation = Observation::new(1, 1_000, [0.1, 0.2, 0.3, 0.4]);
    let frame = encode_observation(&observation);

    c.bench_function("encode_observation", |b| {
        b.iter(|| encode_observation(black_box(&observation)));
    });

    c.bench_function("decode_observation", |b| {
        b.iter(|| decode_observation(black_box(&frame)));
    });
}

fn bench_control_law(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_header_and_body");
    for size in [0usize, 16, 256, MAX_CONTROL_LAW_SIZE] {
        let payload = vec![0xA5u8; size];
        let Ok(body) = ControlLawBody::from_slice(&payload) else {
            continue;
        };
        let header = ControlLawHeader::for_body(&body);
        let mut buffer = [0u8; BUFFER_CAPACITY];

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| encode_header_and_body(black_box(&header), black_box(&body), &mut buffer));
        });
    }
    group.finish();

    let payload = [0x5Au8; 16];
    c.bench_function("decode_body_16", |b| {
        b.iter(|| decode_body(black_box(&payload), black_box(16)));
    });
}

criterion_group!(benches, bench_observation, bench_control_law);
criterion_main!(benches);
