//! Throughput benchmarks

use bytes::BytesMut;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use sw16_setup::core::protocol::checksum::sum8_checksum;
use sw16_setup::core::protocol::{DelimiterFramer, FrameCodec, Sw16Codec, STATUS_QUERY_OPCODE};
use tokio_util::codec::Decoder;

fn status_body() -> Vec<u8> {
    let mut body = vec![0xCC];
    body.extend((0..17u8).map(|i| i % 0x50));
    body.push(sum8_checksum(&body[1..18]));
    body
}

fn codec_benchmark(c: &mut Criterion) {
    let codec = Sw16Codec::new();
    let body = status_body();

    let mut group = c.benchmark_group("codec");

    group.bench_function("encode_status_query", |b| {
        b.iter(|| black_box(codec.encode(black_box(STATUS_QUERY_OPCODE))))
    });

    group.throughput(Throughput::Bytes(body.len() as u64));
    group.bench_function("validate_response", |b| {
        b.iter(|| black_box(codec.is_valid(black_box(&body))))
    });

    group.finish();
}

fn framing_benchmark(c: &mut Criterion) {
    let mut stream = Vec::new();
    for _ in 0..256 {
        stream.extend_from_slice(&status_body());
        stream.push(0xDD);
    }

    let mut group = c.benchmark_group("framing");
    group.throughput(Throughput::Bytes(stream.len() as u64));

    group.bench_function("split_frames", |b| {
        b.iter(|| {
            let mut framer = DelimiterFramer::new();
            let mut buf = BytesMut::from(black_box(&stream[..]));
            let mut frames = 0;
            while let Ok(Some(frame)) = framer.decode(&mut buf) {
                black_box(frame);
                frames += 1;
            }
            frames
        })
    });

    group.finish();
}

criterion_group!(benches, codec_benchmark, framing_benchmark);
criterion_main!(benches);
