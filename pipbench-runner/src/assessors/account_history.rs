//! Final equity per period, with mean and standard deviation across periods.

use clap::Parser;
use pipbench_core::domain::PeriodId;
use serde::Serialize;
use std::collections::BTreeMap;

use super::{parse_options, Assessor, AssessorError, AssessorReport};
use crate::scheduler::{PeriodFailure, PeriodHandle};

#[derive(Debug, Parser)]
struct Options {
    /// List every period's final equity, not just the aggregate.
    #[arg(long)]
    show_periods: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquitySummary {
    pub periods: BTreeMap<PeriodId, f64>,
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
}

impl EquitySummary {
    pub fn from_finals(periods: BTreeMap<PeriodId, f64>) -> Self {
        let n = periods.len() as f64;
        if periods.is_empty() {
            return Self {
                periods,
                mean: 0.0,
                std_dev: 0.0,
            };
        }
        let mean = periods.values().sum::<f64>() / n;
        let variance = periods.values().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Self {
            periods,
            mean,
            std_dev: variance.sqrt(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AccountHistory {
    show_periods: bool,
}

impl AccountHistory {
    pub fn new(show_periods: bool) -> Self {
        Self { show_periods }
    }

    pub fn from_options(options: &str) -> Result<Self, AssessorError> {
        let parsed: Options = parse_options("account_history", options)?;
        Ok(Self::new(parsed.show_periods))
    }
}

impl Assessor for AccountHistory {
    fn name(&self) -> &str {
        "account_history"
    }

    fn analyse(&mut self, handles: &[PeriodHandle]) -> Result<AssessorReport, PeriodFailure> {
        let mut finals = BTreeMap::new();
        for handle in handles {
            let account = handle.wait()?;
            finals.insert(account.period_id, account.final_equity());
        }
        let summary = EquitySummary::from_finals(finals);

        let mut lines = Vec::new();
        if self.show_periods {
            for (period, equity) in &summary.periods {
                lines.push(format!("period {period}: {equity:>14.2}"));
            }
        }
        lines.push(format!("periods: {}", summary.periods.len()));
        lines.push(format!("mean final equity: {:.2}", summary.mean));
        lines.push(format!("std dev:           {:.2}", summary.std_dev));

        Ok(AssessorReport {
            assessor: self.name().to_string(),
            lines,
            body: serde_json::to_value(&summary).unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipbench_core::domain::{Account, Symbol};

    fn account(period: usize, equity: &[f64]) -> Account {
        let mut account = Account::new(PeriodId(period), vec![Symbol::new("EURUSD").unwrap()], 0.0);
        for &e in equity {
            account.balance = e;
            account.record_curve();
        }
        account
    }

    #[test]
    fn summary_statistics() {
        let s = EquitySummary::from_finals(BTreeMap::from([(PeriodId(0), 10.0), (PeriodId(1), 30.0)]));
        assert_eq!(s.mean, 20.0);
        assert_eq!(s.std_dev, 10.0);
        assert_eq!(EquitySummary::from_finals(BTreeMap::new()).mean, 0.0);
    }

    #[test]
    fn aggregates_by_period_not_by_handle_order() {
        let handles = vec![
            PeriodHandle::ready(PeriodId(2), Ok(account(2, &[0.0, 5.0]))),
            PeriodHandle::ready(PeriodId(0), Ok(account(0, &[0.0, -5.0]))),
        ];
        let report = AccountHistory::new(true).analyse(&handles).unwrap();
        assert_eq!(report.lines[0], format!("period 000: {:>14.2}", -5.0));
        assert_eq!(report.lines[1], format!("period 002: {:>14.2}", 5.0));
        assert_eq!(report.body["mean"], 0.0);
        assert_eq!(report.body["periods"]["2"], 5.0);
    }

    #[test]
    fn hides_periods_by_default() {
        let handles = vec![PeriodHandle::ready(PeriodId(0), Ok(account(0, &[1.0])))];
        let report = AccountHistory::from_options("").unwrap().analyse(&handles).unwrap();
        assert_eq!(report.lines.len(), 3);
        assert!(AccountHistory::from_options("--show-periods").unwrap().show_periods);
    }

    #[test]
    fn failed_period_fails_the_assessment() {
        let handles = vec![PeriodHandle::ready(
            PeriodId(4),
            Err(PeriodFailure::WorkerLost { period_id: PeriodId(4) }),
        )];
        assert!(AccountHistory::default().analyse(&handles).is_err());
    }
}
