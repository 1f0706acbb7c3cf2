//! Ledger, generator and driver benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lottery_ledger::driver::{CheckConfig, PropertyDriver};
use lottery_ledger::generator::{minimize, GenerationStrategy, TransactionGenerator};
use lottery_ledger::ledger::{BoundaryPolicy, Ledger};

fn benchmark_apply(c: &mut Criterion) {
    let script = TransactionGenerator::new(5, 42)
        .expect("generator")
        .sequence(1000);

    c.bench_function("apply_1000_transactions_clamp", |b| {
        b.iter(|| {
            let mut ledger = Ledger::new(5, 5).expect("ledger");
            for &tx in &script {
                let _ = ledger.apply(black_box(tx));
            }
            ledger
        });
    });
}

fn benchmark_check(c: &mut Criterion) {
    let ledger = Ledger::new(64, 25).expect("ledger");

    c.bench_function("check_64_processes", |b| {
        b.iter(|| black_box(&ledger).is_valid());
    });
}

fn benchmark_generation(c: &mut Criterion) {
    c.bench_function("generate_100_uniform_sequences", |b| {
        b.iter(|| {
            TransactionGenerator::new(5, 42)
                .expect("generator")
                .generate(&GenerationStrategy::default(), 100)
        });
    });
}

fn benchmark_shrink(c: &mut Criterion) {
    let mut script = TransactionGenerator::new(5, 3)
        .expect("generator")
        .sequence(100);
    script.extend(vec![lottery_ledger::Transaction::Penalise(2); 5]);

    let still_fails = |candidate: &[lottery_ledger::Transaction]| {
        let mut ledger = Ledger::new(5, 5)
            .expect("ledger")
            .with_policy(BoundaryPolicy::Unchecked);
        candidate.iter().any(|&tx| {
            let _ = ledger.apply(tx);
            !ledger.is_valid()
        })
    };

    c.bench_function("shrink_105_transactions", |b| {
        b.iter(|| minimize(script.clone(), still_fails, 1000));
    });
}

fn benchmark_property_check(c: &mut Criterion) {
    let driver = PropertyDriver::new(CheckConfig::default()).expect("driver");

    c.bench_function("property_check_100_cases", |b| {
        b.iter(|| driver.check().expect("check should succeed"));
    });
}

criterion_group!(
    benches,
    benchmark_apply,
    benchmark_check,
    benchmark_generation,
    benchmark_shrink,
    benchmark_property_check
);
criterion_main!(benches);
