//! Speculative accuracy: how much of the available move each position captured.
//!
//! Per position, with pip distances measured from the window's open:
//!
//! | case | accuracy |
//! |---|---|
//! | `max_profit > 0` | `actual_profit / max_profit` |
//! | no profit possible, order not taken | `1.0` |
//! | no profit possible, `max_loss < 0` | `-actual_profit / max_loss` |
//! | otherwise | `0.0` |
//!
//! Scores are unbounded below. Aggregated per period id as mean and
//! population standard deviation, then across the period means.

use clap::Parser;
use pipbench_core::domain::{Direction, PeriodId, Position, PositionId, Status};
use pipbench_core::symbols::to_pips;
use serde::Serialize;
use std::collections::BTreeMap;

use super::{parse_options, Assessor, AssessorError, AssessorReport};
use crate::scheduler::{PeriodFailure, PeriodHandle};

#[derive(Debug, Parser)]
struct Options {
    /// List every position's score, not just the aggregates.
    #[arg(long)]
    show_results: bool,
}

/// Best, worst and realized move of one position, in pips.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RateChanges {
    pub max_profit: f64,
    pub max_loss: f64,
    pub actual_profit: f64,
}

impl RateChanges {
    pub fn of(position: &Position) -> Self {
        let symbol = position.order.symbol;
        let window = &position.window;
        let long = matches!(position.order.direction, Direction::Buy | Direction::DontBuy);
        let (max_profit, max_loss) = if long {
            (window.high - window.open, window.low - window.open)
        } else {
            (window.open - window.low, window.open - window.high)
        };

        let open = position
            .open_rate
            .or(position.order.open_bid)
            .unwrap_or(window.open);
        let close = match (position.close_rate, position.status) {
            (Some(rate), _) => rate,
            (None, Status::Open) => window.close,
            // never filled
            (None, _) => open,
        };
        let actual = match position.order.direction {
            Direction::Buy => close - open,
            Direction::Sell => open - close,
            Direction::DontBuy | Direction::DontSell => 0.0,
        };

        Self {
            max_profit: to_pips(symbol, max_profit),
            max_loss: to_pips(symbol, max_loss),
            actual_profit: to_pips(symbol, actual),
        }
    }
}

pub fn accuracy(changes: &RateChanges, status: Status) -> f64 {
    if changes.max_profit > 0.0 {
        changes.actual_profit / changes.max_profit
    } else if status == Status::NotTaken {
        1.0
    } else if changes.max_loss < 0.0 {
        -changes.actual_profit / changes.max_loss
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Spread {
    pub count: usize,
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
}

impl Spread {
    pub fn of(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Self {
            count: values.len(),
            mean,
            std_dev: variance.sqrt(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodAccuracy {
    #[serde(flatten)]
    pub all: Spread,
    /// Positions where some profit was available.
    pub possible: Spread,
    pub impossible: Spread,
}

impl PeriodAccuracy {
    fn of(scored: &[(RateChanges, f64)]) -> Self {
        let pick = |possible: bool| -> Vec<f64> {
            scored
                .iter()
                .filter(|(c, _)| (c.max_profit > 0.0) == possible)
                .map(|(_, a)| *a)
                .collect()
        };
        let all: Vec<f64> = scored.iter().map(|(_, a)| *a).collect();
        Self {
            all: Spread::of(&all),
            possible: Spread::of(&pick(true)),
            impossible: Spread::of(&pick(false)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccuracySummary {
    pub periods: BTreeMap<PeriodId, PeriodAccuracy>,
    /// Spread of the per-period means.
    pub overall: Spread,
}

#[derive(Debug, Clone, Default)]
pub struct SpeculativeAccuracy {
    show_results: bool,
}

impl SpeculativeAccuracy {
    pub fn new(show_results: bool) -> Self {
        Self { show_results }
    }

    pub fn from_options(options: &str) -> Result<Self, AssessorError> {
        let parsed: Options = parse_options("speculative_accuracy", options)?;
        Ok(Self::new(parsed.show_results))
    }
}

fn result_line(period: PeriodId, id: PositionId, position: &Position, changes: &RateChanges, score: f64) -> String {
    format!(
        "period {period} {:>8} {} {:<9} {:<20} {:>10.1} {:>10.1} {:>10.1} {:>10.5}",
        id.to_string(),
        position.order.symbol,
        position.order.direction.to_string(),
        position.status.name(),
        changes.actual_profit,
        changes.max_profit,
        changes.max_loss,
        score,
    )
}

impl Assessor for SpeculativeAccuracy {
    fn name(&self) -> &str {
        "speculative_accuracy"
    }

    fn analyse(&mut self, handles: &[PeriodHandle]) -> Result<AssessorReport, PeriodFailure> {
        let mut results: BTreeMap<PeriodId, Vec<String>> = BTreeMap::new();
        let mut periods = BTreeMap::new();
        for handle in handles {
            let account = handle.wait()?;
            let mut scored = Vec::with_capacity(account.history.len());
            let mut lines = Vec::new();
            for (&id, position) in &account.history {
                let changes = RateChanges::of(position);
                let score = accuracy(&changes, position.status);
                if self.show_results {
                    lines.push(result_line(account.period_id, id, position, &changes, score));
                }
                scored.push((changes, score));
            }
            results.insert(account.period_id, lines);
            periods.insert(account.period_id, PeriodAccuracy::of(&scored));
        }

        let means: Vec<f64> = periods.values().map(|p| p.all.mean).collect();
        let summary = AccuracySummary {
            overall: Spread::of(&means),
            periods,
        };

        let mut lines: Vec<String> = results.into_values().flatten().collect();
        lines.push(format!("{:<8}{:>12}{:>12}{:>10}", "period", "mean", "std dev", "count"));
        for (period, acc) in &summary.periods {
            lines.push(format!(
                "{:<8}{:>12.5}{:>12.5}{:>10}",
                period.to_string(),
                acc.all.mean,
                acc.all.std_dev,
                acc.all.count
            ));
        }
        lines.push(format!(
            "{:<8}{:>12.5}{:>12.5}{:>10}",
            "overall", summary.overall.mean, summary.overall.std_dev, summary.overall.count
        ));

        Ok(AssessorReport {
            assessor: self.name().to_string(),
            lines,
            body: serde_json::to_value(&summary).unwrap_or_default(),
        })
    }
}
