//! Frame encode/decode throughput

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use udp_audio_streamer::codec::{decode, encode};

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_codec");

    for chunk_size in [1024usize, 4096, 16384] {
        let payload: Vec<u8> = (0..chunk_size).map(|i| (i % 256) as u8).collect();
        let datagram = encode(123_456, 1_700_000_000_123, &payload);

        group.throughput(Throughput::Bytes(chunk_size as u64));
        group.bench_with_input(BenchmarkId::new("encode", chunk_size), &payload, |b, payload| {
            b.iter(|| encode(black_box(123_456), black_box(1_700_000_000_123), black_box(payload)))
        });
        group.bench_with_input(BenchmarkId::new("decode", chunk_size), &datagram, |b, datagram| {
            b.iter(|| decode(black_box(datagram)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_codec);
criterion_main!(benches);
