//! Criterion benchmarks for the simulation hot paths.
//!
//! Benchmarks:
//! 1. Full period loop (simulate and benchmark modes)
//! 2. Order sanitization
//! 3. Symbol graph conversion and cross-rate derivation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use chrono::{Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

use pipbench_core::domain::{Bar, Currency, Direction, Frame, Order, PeriodId, Symbol};
use pipbench_core::engine::{sanitize_orders, PeriodSimulator, RunMode, SimConfig};
use pipbench_core::predictors::{Predictor, RandomDirection};
use pipbench_core::symbols::SymbolGraph;

// ── Helpers ──────────────────────────────────────────────────────────

fn sym(id: &str) -> Symbol {
    Symbol::new(id).unwrap()
}

fn make_frames(n: usize) -> Vec<Frame> {
    let start = Utc.timestamp_opt(1_600_000_000, 0).unwrap();
    (0..n)
        .map(|i| {
            let t = start + Duration::minutes(i as i64);
            let wave = (i as f64 * 0.1).sin();
            let eurusd = 1.10 + wave * 0.002;
            let usdjpy = 105.0 + wave * 0.2;
            let bar = |symbol: Symbol, close: f64, spread: f64| Bar {
                symbol,
                timestamp: t,
                open: close - spread / 3.0,
                high: close + spread,
                low: close - spread,
                close,
            };
            Frame::new(
                t,
                vec![
                    bar(sym("EURUSD"), eurusd, 0.0003),
                    bar(sym("USDJPY"), usdjpy, 0.03),
                ],
            )
        })
        .collect()
}

fn make_simulator(mode: RunMode, hold: Option<usize>) -> PeriodSimulator {
    let graph = SymbolGraph::new(&[sym("EURUSD"), sym("USDJPY")]).unwrap();
    let config = SimConfig {
        mode,
        hold_minutes: hold,
        ..SimConfig::default()
    };
    PeriodSimulator::new(
        Arc::new(graph),
        vec![sym("EURUSD"), sym("USDJPY"), sym("EURJPY")],
        config,
    )
    .unwrap()
}

// ── 1. Period loop ───────────────────────────────────────────────────

fn bench_period_loop(c: &mut Criterion) {
    let mut group = c.benchmark_group("period_loop");

    for &minutes in &[240, 1440] {
        let frames = make_frames(minutes);
        let simulate = make_simulator(RunMode::Simulate, Some(30));
        let benchmark = make_simulator(RunMode::Benchmark, Some(30));

        group.bench_with_input(BenchmarkId::new("simulate", minutes), &minutes, |b, _| {
            b.iter(|| {
                let mut predictor = RandomDirection::new(StdRng::seed_from_u64(1));
                simulate
                    .run(PeriodId(0), black_box(&frames), &mut predictor)
                    .unwrap()
            });
        });
        group.bench_with_input(BenchmarkId::new("benchmark", minutes), &minutes, |b, _| {
            b.iter(|| {
                let mut predictor = RandomDirection::new(StdRng::seed_from_u64(1));
                benchmark
                    .run(PeriodId(0), black_box(&frames), &mut predictor)
                    .unwrap()
            });
        });
    }

    group.finish();
}

// ── 2. Sanitization ──────────────────────────────────────────────────

fn bench_sanitize(c: &mut Criterion) {
    let mut group = c.benchmark_group("sanitize_orders");
    let symbols = vec![sym("EURUSD"), sym("USDJPY"), sym("EURJPY")];
    let frames = make_frames(1);
    let mut predictor = RandomDirection::new(StdRng::seed_from_u64(5));
    let mut raw = predictor.on_bar(&frames[0].bars).unwrap_or_default();
    raw.push(Order::market(sym("EURUSD"), Direction::Buy).with_take_profit(1.2));

    group.bench_function("three_symbols", |b| {
        b.iter(|| sanitize_orders(black_box(&symbols), Some(black_box(raw.as_slice()))).unwrap());
    });
    group.bench_function("absent_list", |b| {
        b.iter(|| sanitize_orders(black_box(&symbols), None).unwrap());
    });

    group.finish();
}

// ── 3. Symbol graph ──────────────────────────────────────────────────

fn bench_symbol_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("symbol_graph");
    let graph = SymbolGraph::new(&[sym("EURUSD"), sym("USDJPY"), sym("GBPUSD"), sym("AUDNZD")]).unwrap();
    let frame = make_frames(1).remove(0);

    group.bench_function("derive_eurjpy", |b| {
        b.iter(|| graph.derive_bar(black_box(sym("EURJPY")), &frame));
    });
    group.bench_function("pip_value_jpy", |b| {
        b.iter(|| graph.pip_value(black_box(sym("EURJPY")), Currency::USD, 100_000.0, &frame));
    });

    group.finish();
}

criterion_group!(benches, bench_period_loop, bench_sanitize, bench_symbol_graph);
criterion_main!(benches);
