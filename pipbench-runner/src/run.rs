//! Run orchestration: wires configuration, data, scheduler and assessors.
//!
//! Two entry points:
//! - `run_from_config()`: loads the configured data source, then runs. Used by the CLI.
//! - `run_with_data()`: takes pre-loaded market data. Used by tests and benchmarks.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use pipbench_core::domain::{Currency, Symbol};
use pipbench_core::engine::PeriodSimulator;
use pipbench_core::symbols::SymbolGraph;
use pipbench_core::CoreError;

use crate::assessors::{create_assessor, AssessorError, AssessorReport};
use crate::config::{ConfigError, RunConfig};
use crate::data_loader::{load_csv, synthetic, LoadError, MarketData};
use crate::periods::plan_periods;
use crate::scheduler::{PeriodFailure, PeriodHandle, PeriodScheduler, SchedulerError};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Load(#[from] LoadError),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("none of the requested symbols can be traded in {currency}")]
    NoTradableSymbols { currency: Currency },
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    #[error(transparent)]
    Assessor(#[from] AssessorError),
    #[error(transparent)]
    Period(#[from] PeriodFailure),
}

/// Start of synthetic data: 2020-01-01T00:00:00Z.
const SYNTHETIC_EPOCH: i64 = 1_577_836_800;

/// What a finished run hands back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub tradable: Vec<Symbol>,
    /// Requested symbols that could not be traded.
    pub dropped: Vec<Symbol>,
    /// Symbols whose data feeds the run, conversion legs included.
    pub data_symbols: Vec<Symbol>,
    pub periods: usize,
    pub minutes_per_period: usize,
    pub reports: Vec<AssessorReport>,
}

/// Load the configured data source and run.
pub fn run_from_config(config: &RunConfig) -> Result<RunOutcome, RunError> {
    config.validate()?;
    let data = match (&config.data.path, &config.data.synthetic) {
        (Some(path), _) => load_csv(path)?,
        (None, Some(synth)) => {
            let symbols = Symbol::parse_list(&synth.symbols)?;
            let start = Utc
                .timestamp_opt(SYNTHETIC_EPOCH, 0)
                .single()
                .ok_or_else(|| CoreError::data("synthetic start time out of range"))?;
            synthetic(&symbols, synth.minutes, synth.seed.unwrap_or(config.run.seed), start)
        }
        (None, None) => {
            return Err(RunError::Config(ConfigError::Invalid {
                section: "data",
                field: "path",
                reason: "either path or synthetic is required".into(),
            }))
        }
    };
    run_with_data(config, &data)
}

/// Split requested symbols into tradable and dropped.
///
/// A symbol is tradable when the graph can price it and its quote currency
/// converts into the account currency.
pub fn tradable_symbols(
    requested: &[Symbol],
    graph: &SymbolGraph,
    account: Currency,
) -> (Vec<Symbol>, Vec<Symbol>) {
    requested.iter().copied().partition(|&symbol| {
        graph.is_reachable(symbol) && graph.path(symbol.quote(), account).is_some()
    })
}

/// Every data symbol needed to price the tradable set and convert its quote
/// currencies into the account currency.
pub fn data_symbols(
    tradable: &[Symbol],
    graph: &SymbolGraph,
    account: Currency,
) -> Result<BTreeSet<Symbol>, CoreError> {
    let mut needed = graph.required_symbols(tradable)?;
    for symbol in tradable {
        if let Some(path) = graph.path(symbol.quote(), account) {
            needed.extend(path.iter().map(|hop| hop.symbol));
        }
    }
    Ok(needed)
}

/// Run every period over pre-loaded data and feed the handles to the assessors.
pub fn run_with_data(config: &RunConfig, data: &MarketData) -> Result<RunOutcome, RunError> {
    config.validate()?;
    let account = config.account_currency()?;
    let requested = config.requested_symbols()?;

    let universe = SymbolGraph::new(&data.available())?;
    let (tradable, dropped) = tradable_symbols(&requested, &universe, account);
    for symbol in &dropped {
        warn!(%symbol, %account, "dropping symbol: cannot be priced or converted from the available data");
    }
    if tradable.is_empty() {
        return Err(RunError::NoTradableSymbols { currency: account });
    }

    // Price only from the symbols actually loaded into frames.
    let needed = data_symbols(&tradable, &universe, account)?;
    let graph = SymbolGraph::new(&needed.iter().copied().collect::<Vec<_>>())?;
    let frames = Arc::new(data.frames(&needed));
    let plans = plan_periods(frames.len(), config.run.period_count, config.run.period_minutes)?;
    let minutes_per_period = plans.first().map(|p| p.len).unwrap_or_default();
    info!(
        tradable = tradable.len(),
        data_symbols = needed.len(),
        minutes = frames.len(),
        periods = plans.len(),
        mode = %config.run.mode,
        "run planned"
    );

    let simulator = PeriodSimulator::new(Arc::new(graph), tradable.clone(), config.sim_config()?)?;
    let scheduler = PeriodScheduler::new(
        config.run.worker_count,
        simulator,
        config.predictor.clone(),
        config.run.seed,
    )?;
    let handles = scheduler.submit_all(&plans, &frames);

    let mut reports = Vec::with_capacity(config.assessors.len());
    for assessor_config in &config.assessors {
        let mut assessor = create_assessor(assessor_config)?;
        reports.push(assessor.analyse(&handles)?);
    }
    // Surface a failed period even when no assessor looked at it.
    wait_all(&handles)?;
    info!(periods = handles.len(), "run finished");

    Ok(RunOutcome {
        tradable,
        dropped,
        data_symbols: needed.into_iter().collect(),
        periods: handles.len(),
        minutes_per_period,
        reports,
    })
}

fn wait_all(handles: &[PeriodHandle]) -> Result<(), PeriodFailure> {
    for handle in handles {
        handle.wait()?;
    }
    Ok(())
}
