//! Criterion benchmarks for PMML hot paths.
//!
//! Benchmarks:
//! 1. Feature derivation over one market's observations
//! 2. Rolling sample stddev
//! 3. Row → DataFrame conversion

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use pmml_core::data::fixture::{candle, yes_no_market};
use pmml_core::domain::Observation;
use pmml_core::features::rolling::{first_difference, rolling_sample_std};
use pmml_core::features::{derive_features, MarketAttributes, VOL_WINDOW};
use pmml_core::storage::rows_to_dataframe;

// ── Helpers ──────────────────────────────────────────────────────────

const DAY: i64 = 86_400;

fn make_observations(n: usize) -> Vec<Observation> {
    (0..n)
        .map(|i| {
            let mid = 0.5 + (i as f64 * 0.1).sin() * 0.3;
            let (bid, ask) = if i % 5 == 0 {
                (None, None)
            } else {
                (Some(mid - 0.01), Some(mid + 0.01))
            };
            Observation {
                token_id: Some(if i % 2 == 0 { "yes" } else { "no" }.to_string()),
                // Reverse order so the sort does real work.
                candle: candle((n - i) as i64 * DAY, bid, ask, Some(mid), (i % 3) as f64),
            }
        })
        .collect()
}

fn attrs(n: usize) -> MarketAttributes {
    let end = (n as i64 + 1) * DAY;
    MarketAttributes::from_market(&yes_no_market("bench", "0xbench", end, true), end)
}

// ── 1. Derivation ────────────────────────────────────────────────────

fn bench_derive(c: &mut Criterion) {
    let mut group = c.benchmark_group("derive_features");
    for n in [90usize, 180, 1_000] {
        let observations = make_observations(n);
        let attrs = attrs(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| derive_features(black_box(&attrs), black_box(&observations)))
        });
    }
    group.finish();
}

// ── 2. Rolling stddev ────────────────────────────────────────────────

fn bench_rolling(c: &mut Criterion) {
    let prices: Vec<f64> = (0..1_000).map(|i| 0.5 + (i as f64 * 0.05).cos() * 0.4).collect();
    let returns = first_difference(&prices);
    c.bench_function("rolling_sample_std_1000", |b| {
        b.iter(|| rolling_sample_std(black_box(&returns), VOL_WINDOW))
    });
}

// ── 3. DataFrame conversion ──────────────────────────────────────────

fn bench_dataframe(c: &mut Criterion) {
    let rows = derive_features(&attrs(2_500), &make_observations(2_500)).rows;
    c.bench_function("rows_to_dataframe_2500", |b| {
        b.iter(|| rows_to_dataframe(black_box(&rows)))
    });
}

criterion_group!(benches, bench_derive, bench_rolling, bench_dataframe);
criterion_main!(benches);
