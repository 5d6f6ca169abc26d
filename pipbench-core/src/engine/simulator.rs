//! Period simulator: drives one period's minute loop end to end.
//!
//! Per period:
//! 1. Validate the frames and price every tradable cross symbol.
//! 2. `on_period_start` with minute 0's bars, then the first curve point.
//! 3. For each later minute: ledger step, then (while the minute still has a
//!    future) `on_bar` → sanitize → place or benchmark.
//! 4. Finalize the account, then `on_period_end`.
//!
//! Minutes are processed strictly in order; the loop never yields.

use super::ledger::PositionLedger;
use super::sanitize::sanitize_orders;
use crate::domain::{validate_frames, Account, Bar, Currency, Frame, Order, PeriodId, Symbol};
use crate::error::{CoreError, CoreResult};
use crate::predictors::Predictor;
use crate::symbols::SymbolGraph;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// How orders are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// One persistent ledger per period.
    #[default]
    Simulate,
    /// Each minute's orders evaluated independently over a fixed horizon.
    Benchmark,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Simulate => f.write_str("simulate"),
            RunMode::Benchmark => f.write_str("benchmark"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    pub mode: RunMode,
    pub hold_minutes: Option<usize>,
    pub account_currency: Currency,
    pub lot_size: f64,
    pub initial_balance: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::Simulate,
            hold_minutes: None,
            account_currency: Currency::USD,
            lot_size: 100_000.0,
            initial_balance: 0.0,
        }
    }
}

/// The loop stage a period failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ValidateFrames,
    DeriveBars,
    Sanitize,
    Place,
    Benchmark,
    Step,
    Finalize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::ValidateFrames => "validate_frames",
            Stage::DeriveBars => "derive_bars",
            Stage::Sanitize => "sanitize_orders",
            Stage::Place => "place",
            Stage::Benchmark => "calculate_positions",
            Stage::Step => "step",
            Stage::Finalize => "finalize",
        };
        f.write_str(name)
    }
}

/// A core error tagged with where in which period it happened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("period {period_id} failed at minute {minute} in {stage}: {source}")]
pub struct SimulationError {
    pub period_id: PeriodId,
    pub minute: usize,
    pub stage: Stage,
    pub source: CoreError,
}

trait AtStage<T> {
    fn at(self, period_id: PeriodId, minute: usize, stage: Stage) -> Result<T, SimulationError>;
}

impl<T> AtStage<T> for CoreResult<T> {
    fn at(self, period_id: PeriodId, minute: usize, stage: Stage) -> Result<T, SimulationError> {
        self.map_err(|source| SimulationError {
            period_id,
            minute,
            stage,
            source,
        })
    }
}

/// Runs periods against a fixed tradable set. Shareable across workers.
#[derive(Debug, Clone)]
pub struct PeriodSimulator {
    ledger: PositionLedger,
    tradable: Vec<Symbol>,
    config: SimConfig,
}

impl PeriodSimulator {
    pub fn new(graph: Arc<SymbolGraph>, tradable: Vec<Symbol>, config: SimConfig) -> CoreResult<Self> {
        if tradable.is_empty() {
            return Err(CoreError::validation("tradable symbol set must not be empty"));
        }
        if let Some(&unreachable) = tradable.iter().find(|s| !graph.is_reachable(**s)) {
            return Err(CoreError::validation(format!(
                "{unreachable} cannot be priced from the available symbols"
            )));
        }
        match (config.mode, config.hold_minutes) {
            (_, Some(0)) => {
                return Err(CoreError::validation("hold_minutes must be at least 1"));
            }
            (RunMode::Benchmark, None) => {
                return Err(CoreError::validation("benchmark mode requires hold_minutes"));
            }
            _ => {}
        }
        if !config.initial_balance.is_finite() {
            return Err(CoreError::validation("initial balance must be finite"));
        }
        let ledger = PositionLedger::new(graph, config.account_currency, config.lot_size)?;
        Ok(Self {
            ledger,
            tradable,
            config,
        })
    }

    pub fn tradable(&self) -> &[Symbol] {
        &self.tradable
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Last minute at which `on_bar` is called for a period of `n` frames.
    pub fn last_order_minute(&self, n: usize) -> CoreResult<usize> {
        let last = match (self.config.mode, self.config.hold_minutes) {
            (RunMode::Benchmark, Some(hold)) => hold.checked_add(1).and_then(|h| n.checked_sub(h)),
            _ => n.checked_sub(2),
        };
        match last {
            Some(minute) if minute >= 1 => Ok(minute),
            _ => Err(CoreError::data(format!(
                "period of {n} minutes is too short for {} mode{}",
                self.config.mode,
                self.config
                    .hold_minutes
                    .map(|h| format!(" with hold_minutes {h}"))
                    .unwrap_or_default()
            ))),
        }
    }

    /// Simulate one period and return its finalized account.
    pub fn run(
        &self,
        period_id: PeriodId,
        frames: &[Frame],
        predictor: &mut dyn Predictor,
    ) -> Result<Account, SimulationError> {
        validate_frames(frames).at(period_id, 0, Stage::ValidateFrames)?;
        let last_order = self
            .last_order_minute(frames.len())
            .at(period_id, 0, Stage::ValidateFrames)?;

        let frames = self.price_frames(period_id, frames)?;
        let n = frames.len();
        debug!(period = %period_id, minutes = n, mode = %self.config.mode, "period started");

        let mut account = Account::new(period_id, self.tradable.clone(), self.config.initial_balance);
        predictor.on_period_start(&frames[0].subset(&self.tradable));
        account.record_curve();

        for t in 1..n {
            let frame = &frames[t];
            self.ledger
                .step(&mut account, t, frame)
                .at(period_id, t, Stage::Step)?;
            if t > last_order {
                continue;
            }

            let raw = predictor.on_bar(&frame.subset(&self.tradable));
            let orders = sanitize_orders(&self.tradable, raw.as_deref()).at(period_id, t, Stage::Sanitize)?;
            match self.config.mode {
                RunMode::Simulate => self.place_all(&mut account, &frames, t, &orders)?,
                RunMode::Benchmark => self.benchmark(&mut account, &frames, t, &orders)?,
            }
            account.restate_last_point();
        }

        self.ledger
            .finalize(&mut account, &frames[n - 1])
            .at(period_id, n - 1, Stage::Finalize)?;
        predictor.on_period_end();
        debug!(
            period = %period_id,
            positions = account.history.len(),
            equity = account.final_equity(),
            "period finished"
        );
        Ok(account)
    }

    /// Add a derived bar for every tradable symbol the data does not carry.
    fn price_frames(&self, period_id: PeriodId, frames: &[Frame]) -> Result<Vec<Frame>, SimulationError> {
        let graph = self.ledger.graph();
        frames
            .iter()
            .enumerate()
            .map(|(t, frame)| {
                let mut priced = frame.clone();
                for &symbol in &self.tradable {
                    if priced.bar(symbol).is_none() {
                        let bar = graph.derive_bar(symbol, frame).at(period_id, t, Stage::DeriveBars)?;
                        priced.bars.push(bar);
                    }
                }
                Ok(priced)
            })
            .collect()
    }

    fn place_all(
        &self,
        account: &mut Account,
        frames: &[Frame],
        t: usize,
        orders: &[Order],
    ) -> Result<(), SimulationError> {
        let period_id = account.period_id;
        let end = match self.config.hold_minutes {
            Some(hold) => t.saturating_add(hold).min(frames.len() - 1),
            None => frames.len() - 1,
        };
        for order in orders {
            let window = future_window(order.symbol, &frames[t], &frames[t + 1..=end]);
            self.ledger
                .place(account, order, t, &frames[t], window, self.config.hold_minutes)
                .at(period_id, t, Stage::Place)?;
        }
        Ok(())
    }

    fn benchmark(
        &self,
        account: &mut Account,
        frames: &[Frame],
        t: usize,
        orders: &[Order],
    ) -> Result<(), SimulationError> {
        let period_id = account.period_id;
        let hold = self.config.hold_minutes.unwrap_or(1);
        let end = t.saturating_add(hold).min(frames.len() - 1);
        let positions = self
            .ledger
            .calculate_positions(&frames[t], &frames[t + 1..=end], orders, hold)
            .at(period_id, t, Stage::Benchmark)?;
        for position in positions {
            let id = account.allocate_id();
            account.balance += position.realized();
            account.history.insert(id, position);
        }
        Ok(())
    }
}

/// Aggregate of `symbol` over the future frames, or a flat bar at the
/// current close when there are none.
fn future_window(symbol: Symbol, now: &Frame, future: &[Frame]) -> Bar {
    let bars: Vec<&Bar> = future.iter().filter_map(|f| f.bar(symbol)).collect();
    Bar::aggregate(bars).unwrap_or_else(|| {
        let close = now.close(symbol).unwrap_or(0.0);
        Bar::flat(symbol, now.timestamp, close)
    })
}
