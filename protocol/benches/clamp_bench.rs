// Benchmarks for the confidential-value coprocessor.
//
// Covers the primitive ops every ledger transfer is built from, plus the
// full clamp chain of a single transfer: available, min, gate, and the two
// balance updates.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use shroud_protocol::fhe::{clamp, FheContext};

fn bench_trivial_encrypt(c: &mut Criterion) {
    let fhe = FheContext::new();
    c.bench_function("fhe/trivial_encrypt", |b| {
        b.iter(|| fhe.trivial_encrypt(42).unwrap());
    });
}

fn bench_add(c: &mut Criterion) {
    let fhe = FheContext::new();
    let x = fhe.trivial_encrypt(1_000).unwrap();
    let y = fhe.trivial_encrypt(250).unwrap();
    c.bench_function("fhe/add", |b| {
        b.iter(|| fhe.add(x, y).unwrap());
    });
}

fn bench_select(c: &mut Criterion) {
    let fhe = FheContext::new();
    let x = fhe.trivial_encrypt(1_000).unwrap();
    let y = fhe.trivial_encrypt(250).unwrap();
    let cond = fhe.le(x, y).unwrap();
    c.bench_function("fhe/select", |b| {
        b.iter(|| fhe.select(cond, x, y).unwrap());
    });
}

fn bench_transfer_clamp(c: &mut Criterion) {
    let mut group = c.benchmark_group("fhe/transfer_clamp");

    for transfers in [1u64, 10, 100] {
        group.throughput(Throughput::Elements(transfers));
        group.bench_with_input(
            BenchmarkId::from_parameter(transfers),
            &transfers,
            |b, &n| {
                let fhe = FheContext::new();
                let frozen = fhe.trivial_encrypt(100).unwrap();
                let amount = fhe.trivial_encrypt(30).unwrap();
                let allowed = fhe.trivial_bool(true).unwrap();
                b.iter(|| {
                    let mut from = fhe.trivial_encrypt(1_000_000).unwrap();
                    let mut to = fhe.trivial_encrypt(0).unwrap();
                    for _ in 0..n {
                        let free = clamp::available(&fhe, from, frozen).unwrap();
                        let actual = clamp::min(&fhe, amount, free).unwrap();
                        let actual = clamp::gate(&fhe, allowed, actual).unwrap();
                        from = fhe.sub(from, actual).unwrap();
                        to = fhe.add(to, actual).unwrap();
                    }
                    (from, to)
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_trivial_encrypt,
    bench_add,
    bench_select,
    bench_transfer_clamp,
);
criterion_main!(benches);
