//! Benchmarks for the delivery receipt path.
//!
//! Run with: cargo bench --bench receipt

use bytes::BytesMut;
use chrono::Local;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rusmpp::pdus::SubmitSm;
use rusmpp::types::OctetString;
use tokio_util::codec::Encoder;

use smppsim::protocol::SmppCodec;
use smppsim::simulator::{
    MessageIdGenerator, PendingDelivery, ReceiptFormatter, StatusCatalog, StatusSelector,
};

fn bench_receipt_format(c: &mut Criterion) {
    let mut group = c.benchmark_group("receipt/format");
    let outcome = StatusCatalog::lookup("delivered").unwrap();
    let now = Local::now();

    group.bench_function("ascii", |b| {
        b.iter(|| {
            black_box(ReceiptFormatter::format(
                "1700000000000.42",
                &outcome,
                &now,
                &now,
                "Hello World, this is a benchmark message",
            ))
        })
    });

    group.bench_function("multibyte", |b| {
        b.iter(|| {
            black_box(ReceiptFormatter::format(
                "1700000000000.42",
                &outcome,
                &now,
                &now,
                "Привет мир, это тестовое сообщение",
            ))
        })
    });

    group.finish();
}

fn bench_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("receipt/select");
    group.throughput(Throughput::Elements(1));

    let selector = StatusSelector::from_names(&["delivered", "expired", "undelivered"]).unwrap();
    group.bench_function("round_robin", |b| b.iter(|| black_box(selector.next())));

    let ids = MessageIdGenerator::new();
    let now = Local::now();
    group.bench_function("message_id", |b| b.iter(|| black_box(ids.next(&now))));

    group.finish();
}

fn bench_deliver_sm(c: &mut Criterion) {
    let mut group = c.benchmark_group("receipt/deliver_sm");
    let outcome = StatusCatalog::lookup("expired").unwrap();
    let submit = SubmitSm::builder()
        .source_addr("SENDER".parse().unwrap())
        .destination_addr("27831234567".parse().unwrap())
        .short_message(OctetString::from_static_slice(b"Benchmark payload text").unwrap())
        .build();
    let now = Local::now();

    group.bench_function("build_and_encode", |b| {
        let mut codec = SmppCodec::new();
        let mut buf = BytesMut::with_capacity(512);
        b.iter(|| {
            let pending = PendingDelivery::new("1700000000000.42".into(), now, 7, &submit);
            buf.clear();
            codec
                .encode(pending.into_deliver_sm(&outcome, &now), &mut buf)
                .unwrap();
            black_box(buf.len())
        })
    });

    group.finish();
}

criterion_group!(benches, bench_receipt_format, bench_selection, bench_deliver_sm);
criterion_main!(benches);
