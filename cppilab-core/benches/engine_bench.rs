//! Criterion benchmarks for core hot paths.
//!
//! Benchmarks:
//! 1. CPPI daily loop over one and ten trading years
//! 2. Buy-and-hold normalization
//! 3. Regime classification (rolling return + rolling vol + median split)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use chrono::NaiveDate;
use cppilab_core::engine::{simulate_buy_and_hold, simulate_cppi, CppiParams};
use cppilab_core::regime::{classify_regimes, RegimeConfig};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_prices(n: usize) -> Vec<f64> {
    let mut p = 100.0;
    (0..n)
        .map(|i| {
            p *= 1.0 + 0.01 * (i as f64 * 0.37).sin() + 0.0002;
            p
        })
        .collect()
}

// ── 1. CPPI ──────────────────────────────────────────────────────────

fn bench_cppi(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulate_cppi");
    let params = CppiParams::default();

    for n in [252usize, 2520] {
        let prices = make_prices(n);
        let rf = vec![0.0001; n];
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| simulate_cppi(black_box(&prices), black_box(&rf), &params));
        });
    }

    group.finish();
}

// ── 2. Buy-and-hold ──────────────────────────────────────────────────

fn bench_buy_and_hold(c: &mut Criterion) {
    let prices = make_prices(2520);
    c.bench_function("simulate_buy_and_hold_2520", |b| {
        b.iter(|| simulate_buy_and_hold(black_box(&prices), 100.0));
    });
}

// ── 3. Regimes ───────────────────────────────────────────────────────

fn bench_regimes(c: &mut Criterion) {
    let n = 2520;
    let prices = make_prices(n);
    let mut returns = vec![0.0];
    returns.extend(prices.windows(2).map(|w| (w[1] / w[0]).ln()));
    let d0 = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap_or_default();
    let dates: Vec<NaiveDate> = (0..n).map(|i| d0 + chrono::Days::new(i as u64)).collect();
    let config = RegimeConfig::default();

    c.bench_function("classify_regimes_2520", |b| {
        b.iter(|| classify_regimes(&dates, black_box(&prices), &returns, &config));
    });
}

criterion_group!(benches, bench_cppi, bench_buy_and_hold, bench_regimes);
criterion_main!(benches);
