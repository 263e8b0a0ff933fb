//! Performance benchmarks for the LoRaWAN crypto path
//!
//! Measures the AES-128 block core, the payload keystream, the CMAC-based MIC and
//! complete uplink encoding across the payload sizes a frame can carry.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lora_sx127x::lorawan::aes::Aes128;
use lora_sx127x::lorawan::{
    calculate_mic, encode_uplink, encrypt_payload, AesKey, DevAddr, Region, Session,
    MAX_PAYLOAD_LEN,
};
use std::time::Duration;

/// Payload sizes: one partial block, one full block, a typical sensor frame, the maximum
const PAYLOAD_SIZES: [usize; 4] = [2, 16, 32, MAX_PAYLOAD_LEN];

fn generate_test_data(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 256) as u8).collect()
}

fn test_key() -> AesKey {
    AesKey::new([
        0x2b, 0x7e, 0x15, 0x16, 0x28, 0xae, 0xd2, 0xa6, 0xab, 0xf7, 0x15, 0x88, 0x09, 0xcf, 0x4f,
        0x3c,
    ])
}

fn bench_aes_block(c: &mut Criterion) {
    let key = test_key();
    let cipher = Aes128::new(&key);
    let block = [0x5Au8; 16];

    c.bench_function("aes128_block", |b| b.iter(|| cipher.encrypt(black_box(&block))));
}

fn bench_payload_cipher(c: &mut Criterion) {
    let mut group = c.benchmark_group("payload_cipher");
    group.measurement_time(Duration::from_secs(5));
    let key = test_key();
    let dev_addr = DevAddr::new([0x26, 0x01, 0x1B, 0xDA]);

    for size in PAYLOAD_SIZES {
        let data = generate_test_data(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| {
                let mut buffer = data.clone();
                encrypt_payload(black_box(&mut buffer), &dev_addr, &key, 42);
                buffer
            })
        });
    }

    group.finish();
}

fn bench_mic(c: &mut Criterion) {
    let mut group = c.benchmark_group("mic");
    group.measurement_time(Duration::from_secs(5));
    let key = test_key();
    let dev_addr = DevAddr::new([0x26, 0x01, 0x1B, 0xDA]);

    for size in PAYLOAD_SIZES {
        let message = generate_test_data(size + 9);
        group.throughput(Throughput::Bytes(message.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &message, |b, message| {
            b.iter(|| calculate_mic(black_box(message), &key, &dev_addr, 42))
        });
    }

    group.finish();
}

fn bench_encode_uplink(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_uplink");
    let session = Session::new(
        DevAddr::new([0x26, 0x01, 0x1B, 0xDA]),
        test_key(),
        test_key(),
        Region::Eu868,
    );

    for size in PAYLOAD_SIZES {
        let payload = generate_test_data(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &payload, |b, payload| {
            b.iter(|| encode_uplink(&session, black_box(payload), 42))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_aes_block,
    bench_payload_cipher,
    bench_mic,
    bench_encode_uplink
);
criterion_main!(benches);
