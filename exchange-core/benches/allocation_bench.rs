use std::hint::black_box;
use std::sync::Arc;
use std::thread;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use exchange_core::prelude::*;
use rust_decimal::Decimal;

fn req(i: u64) -> NewOrderRequest {
    NewOrderRequest {
        cl_ord_id: format!("bench-{i}"),
        session_id: 1,
        symbol: "AAPL".to_string(),
        side: Side::Buy,
        order_type: OrderType::Limit,
        price: Some(Decimal::new(15000 + (i % 1000) as i64, 2)),
        order_qty: 10,
    }
}

fn bench_single_admit(c: &mut Criterion) {
    let mut group = c.benchmark_group("single admit");
    group.throughput(Throughput::Elements(1));
    group.bench_function("admit non-crossing limit order", |b| {
        let book = OrderBook::new();
        let mut i = 0u64;
        b.iter(|| {
            i += 1;
            black_box(book.admit(req(i)));
        });
    });
    group.finish();
}

fn bench_concurrent_admit(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent admit");
    group.throughput(Throughput::Elements(8_000));
    group.bench_function("8 threads x 1000 admits against one book", |b| {
        b.iter(|| {
            let book = Arc::new(OrderBook::new());
            let mut handles = Vec::new();
            for t in 0..8 {
                let book = book.clone();
                handles.push(thread::spawn(move || {
                    for i in 0..1000u64 {
                        black_box(book.admit(req(t * 1000 + i)));
                    }
                }));
            }
            for h in handles {
                h.join().unwrap();
            }
        });
    });
    group.finish();
}

fn bench_bulk_admit(c: &mut Criterion) {
    let mut group = c.benchmark_group("bulk admit");
    group.throughput(Throughput::Elements(100_000));
    group.bench_function("100k non-crossing admits", |b| {
        b.iter(|| {
            let book = OrderBook::new();
            for i in 0..100_000u64 {
                black_box(book.admit(req(i)));
            }
        });
    });
    group.finish();
}

criterion_group!(benches, bench_single_admit, bench_concurrent_admit, bench_bulk_admit);
criterion_main!(benches);
