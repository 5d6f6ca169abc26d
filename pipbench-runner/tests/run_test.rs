//! End-to-end runs through configuration, data, scheduler and assessors.

use std::io::Write;

use pipbench_core::domain::Symbol;
use pipbench_runner::{run_from_config, PeriodFailure, RunConfig, RunError};

fn sym(id: &str) -> Symbol {
    Symbol::new(id).unwrap()
}

fn synthetic_config(extra_run: &str, predictor: &str) -> RunConfig {
    RunConfig::from_toml(&format!(
        r#"
        [run]
        seed = 17
        period_count = 4
        worker_count = 3
        {extra_run}

        [data]
        symbols = ["EURUSD", "EURJPY", "GBPUSD"]
        synthetic = {{ symbols = ["EURUSD", "USDJPY"], minutes = 400 }}

        [predictor]
        type = "{predictor}"

        [[assessors]]
        type = "account_history"
        options = "--show-periods"

        [[assessors]]
        type = "status_summary"

        [[assessors]]
        type = "speculative_accuracy"
        "#
    ))
    .unwrap()
}

#[test]
fn synthetic_run_reports_every_period() {
    let outcome = run_from_config(&synthetic_config("", "random")).unwrap();
    assert_eq!(outcome.tradable, vec![sym("EURUSD"), sym("EURJPY")]);
    assert_eq!(outcome.dropped, vec![sym("GBPUSD")]);
    assert_eq!(outcome.data_symbols, vec![sym("EURUSD"), sym("USDJPY")]);
    assert_eq!(outcome.periods, 4);
    assert_eq!(outcome.minutes_per_period, 100);

    let history = &outcome.reports[0];
    assert_eq!(history.assessor, "account_history");
    assert_eq!(history.body["periods"].as_object().unwrap().len(), 4);

    // simulate mode: on_bar at minutes 1..=98, two symbols, two legs
    let statuses = &outcome.reports[1];
    for period in ["0", "1", "2", "3"] {
        assert_eq!(statuses.body["per_period"][period], 98 * 2 * 2);
    }

    let accuracy = &outcome.reports[2];
    assert_eq!(accuracy.assessor, "speculative_accuracy");
    for period in ["0", "1", "2", "3"] {
        assert_eq!(accuracy.body["periods"][period]["count"], 98 * 2 * 2);
        assert!(accuracy.body["periods"][period]["mean"].as_f64().unwrap().is_finite());
    }
    assert_eq!(accuracy.body["overall"]["count"], 4);
}

#[test]
fn same_seed_same_reports() {
    let a = run_from_config(&synthetic_config("", "random")).unwrap();
    let mut single = synthetic_config("", "random");
    single.run.worker_count = 1;
    let b = run_from_config(&single).unwrap();
    assert_eq!(
        serde_json::to_string(&a.reports).unwrap(),
        serde_json::to_string(&b.reports).unwrap()
    );

    let mut other_seed = synthetic_config("", "random");
    other_seed.run.seed = 18;
    // the synthetic data is pinned so only the predictor stream changes
    other_seed.data.synthetic.as_mut().unwrap().seed = Some(17);
    let c = run_from_config(&other_seed).unwrap();
    assert_ne!(a.reports[0].body, c.reports[0].body);
}

#[test]
fn benchmark_mode_runs() {
    let outcome = run_from_config(&synthetic_config(
        "mode = \"benchmark\"\nhold_minutes = 30",
        "static",
    ))
    .unwrap();
    // on_bar at minutes 1..=69
    assert_eq!(outcome.reports[1].body["per_period"]["2"], 69 * 2 * 2);
}

#[test]
fn csv_source_from_disk() {
    let mut csv = tempfile::NamedTempFile::new().unwrap();
    writeln!(csv, "timestamp,symbol,open,high,low,close").unwrap();
    for minute in 0..60 {
        let ts = 1_577_836_800 + minute * 60;
        let p = 1.1 + (minute % 5) as f64 * 0.0002;
        writeln!(csv, "{ts},EURUSD,{p},{},{},{p}", p + 0.0001, p - 0.0001).unwrap();
    }
    csv.flush().unwrap();

    let config = RunConfig::from_toml(&format!(
        r#"
        [run]
        period_count = 2

        [data]
        path = "{}"
        symbols = ["EURUSD"]

        [predictor]
        type = "random_walk"

        [[assessors]]
        type = "status_summary"
        "#,
        csv.path().display().to_string().replace('\\', "/")
    ))
    .unwrap();
    let outcome = run_from_config(&config).unwrap();
    assert_eq!(outcome.periods, 2);
    assert_eq!(outcome.reports[0].body["per_period"]["1"], 28 * 2);
}

#[test]
fn nothing_tradable_is_an_error() {
    let mut config = synthetic_config("", "random");
    config.data.symbols = vec!["GBPCHF".into()];
    assert!(matches!(
        run_from_config(&config),
        Err(RunError::NoTradableSymbols { .. })
    ));
}

#[test]
fn short_periods_fail_the_run_with_their_id() {
    let mut config = synthetic_config("", "random");
    config.run.period_minutes = Some(2);
    config.assessors.clear();
    match run_from_config(&config) {
        Err(RunError::Period(PeriodFailure::Simulation(e))) => {
            assert_eq!(e.period_id.0, 0);
            assert!(e.source.is_data());
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn too_little_data_for_the_plan() {
    let mut config = synthetic_config("", "random");
    config.run.period_minutes = Some(150);
    let err = run_from_config(&config).unwrap_err();
    assert!(matches!(err, RunError::Core(ref e) if e.is_data()), "{err}");
}
