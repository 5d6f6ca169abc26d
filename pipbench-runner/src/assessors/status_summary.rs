//! Position counts per terminal status, over all periods.

use clap::Parser;
use pipbench_core::domain::{PeriodId, Status};
use serde::Serialize;
use std::collections::BTreeMap;

use super::{parse_options, Assessor, AssessorError, AssessorReport};
use crate::scheduler::{PeriodFailure, PeriodHandle};

#[derive(Debug, Parser)]
struct Options {}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusCounts {
    pub not_taken: usize,
    /// Keyed by status name, in `Status::CLOSED` order.
    pub closed: Vec<(String, usize)>,
    pub per_period: BTreeMap<PeriodId, usize>,
}

#[derive(Debug, Clone, Default)]
pub struct StatusSummary;

impl StatusSummary {
    pub fn from_options(options: &str) -> Result<Self, AssessorError> {
        let _: Options = parse_options("status_summary", options)?;
        Ok(Self)
    }
}

impl Assessor for StatusSummary {
    fn name(&self) -> &str {
        "status_summary"
    }

    fn analyse(&mut self, handles: &[PeriodHandle]) -> Result<AssessorReport, PeriodFailure> {
        let mut counts = StatusCounts {
            closed: Status::CLOSED.iter().map(|s| (s.name().to_string(), 0)).collect(),
            ..StatusCounts::default()
        };
        for handle in handles {
            let account = handle.wait()?;
            counts.not_taken += account.count_status(Status::NotTaken);
            for (slot, status) in counts.closed.iter_mut().zip(Status::CLOSED) {
                slot.1 += account.count_status(status);
            }
            counts
                .per_period
                .insert(account.period_id, account.history.len());
        }

        let mut lines = vec![format!("{:<22}{:>10}", Status::NotTaken.name(), counts.not_taken)];
        for (name, count) in &counts.closed {
            lines.push(format!("{name:<22}{count:>10}"));
        }
        Ok(AssessorReport {
            assessor: self.name().to_string(),
            lines,
            body: serde_json::to_value(&counts).unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pipbench_core::domain::{Account, Bar, Direction, Order, Position, Symbol};

    fn account(period: usize, statuses: &[Status]) -> Account {
        let symbol = Symbol::new("EURUSD").unwrap();
        let ts = Utc.timestamp_opt(1_600_000_000, 0).unwrap();
        let mut account = Account::new(PeriodId(period), vec![symbol], 0.0);
        for &status in statuses {
            let mut p = Position::pending(
                Order::market(symbol, Direction::Buy),
                Bar::flat(symbol, ts, 1.1),
                ts,
                None,
            );
            p.status = status;
            let id = account.allocate_id();
            account.history.insert(id, p);
        }
        account
    }

    #[test]
    fn counts_every_closed_status() {
        let handles = vec![
            PeriodHandle::ready(
                PeriodId(1),
                Ok(account(1, &[Status::ClosedStopLoss, Status::NotTaken, Status::ClosedStopLoss])),
            ),
            PeriodHandle::ready(
                PeriodId(0),
                Ok(account(0, &[Status::ClosedTakeProfit, Status::ClosedEndOfPeriod])),
            ),
        ];
        let report = StatusSummary.analyse(&handles).unwrap();
        assert_eq!(report.lines.len(), 1 + Status::CLOSED.len());
        assert!(report.lines[2].starts_with("CLOSED_STOP_LOSS"));
        assert!(report.lines[2].ends_with('2'));
        assert_eq!(report.body["not_taken"], 1);
        assert_eq!(report.body["per_period"]["0"], 2);
        assert_eq!(report.body["per_period"]["1"], 3);
    }

    #[test]
    fn takes_no_options() {
        assert!(StatusSummary::from_options("").is_ok());
        assert!(StatusSummary::from_options("--show-periods").is_err());
    }
}
