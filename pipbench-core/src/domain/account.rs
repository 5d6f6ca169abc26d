//! Account: the per-period ledger aggregate.

use super::ids::{IdGen, PeriodId, PositionId};
use super::position::{Position, Status};
use super::symbol::Symbol;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which of the three account maps holds a position id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Pending,
    Open,
    History,
}

/// Per-period mutable aggregate.
///
/// A position id lives in exactly one of `pending`, `positions`, `history`.
/// Ordered maps keep serialization (and therefore run-to-run comparison)
/// deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub period_id: PeriodId,
    pub symbol_ids: Vec<Symbol>,
    pub balance: f64,
    /// Balance after each processed minute.
    pub balances: Vec<f64>,
    /// Equity (balance + held value of open positions) after each processed minute.
    pub equity: Vec<f64>,
    pub pending: BTreeMap<PositionId, Position>,
    pub positions: BTreeMap<PositionId, Position>,
    pub history: BTreeMap<PositionId, Position>,
    ids: IdGen,
}

impl Account {
    pub fn new(period_id: PeriodId, symbol_ids: Vec<Symbol>, initial_balance: f64) -> Self {
        Self {
            period_id,
            symbol_ids,
            balance: initial_balance,
            balances: Vec::new(),
            equity: Vec::new(),
            pending: BTreeMap::new(),
            positions: BTreeMap::new(),
            history: BTreeMap::new(),
            ids: IdGen::default(),
        }
    }

    pub fn allocate_id(&mut self) -> PositionId {
        self.ids.next_id()
    }

    /// Number of positions ever created on this account.
    pub fn issued(&self) -> u64 {
        self.ids.issued()
    }

    pub fn locate(&self, id: PositionId) -> Option<Location> {
        if self.pending.contains_key(&id) {
            Some(Location::Pending)
        } else if self.positions.contains_key(&id) {
            Some(Location::Open)
        } else if self.history.contains_key(&id) {
            Some(Location::History)
        } else {
            None
        }
    }

    /// Unrealized value carried by open positions.
    pub fn held_value(&self) -> f64 {
        self.positions.values().map(|p| p.held_value).sum()
    }

    pub fn current_equity(&self) -> f64 {
        self.balance + self.held_value()
    }

    /// Append the current balance and equity to the curves.
    pub fn record_curve(&mut self) {
        self.balances.push(self.balance);
        let equity = self.current_equity();
        self.equity.push(equity);
    }

    /// Overwrite the latest curve point with the current balance and equity.
    pub fn restate_last_point(&mut self) {
        let equity = self.current_equity();
        if let Some(last) = self.balances.last_mut() {
            *last = self.balance;
        }
        if let Some(last) = self.equity.last_mut() {
            *last = equity;
        }
    }

    /// No pending orders and no open positions remain.
    pub fn is_finalized(&self) -> bool {
        self.pending.is_empty() && self.positions.is_empty()
    }

    pub fn final_equity(&self) -> f64 {
        self.equity.last().copied().unwrap_or(self.balance)
    }

    /// Count of history entries with the given status.
    pub fn count_status(&self, status: Status) -> usize {
        self.history.values().filter(|p| p.status == status).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::Bar;
    use crate::domain::order::{Direction, Order};
    use chrono::{TimeZone, Utc};

    fn position(status: Status, held: f64) -> Position {
        let symbol = Symbol::new("EURUSD").unwrap();
        let ts = Utc.timestamp_opt(1_600_000_000, 0).unwrap();
        let mut p = Position::pending(
            Order::market(symbol, Direction::Buy),
            Bar::flat(symbol, ts, 1.1),
            ts,
            None,
        );
        p.status = status;
        p.held_value = held;
        p
    }

    #[test]
    fn equity_includes_held_value() {
        let mut account = Account::new(PeriodId(0), vec![], 100.0);
        let a = account.allocate_id();
        let b = account.allocate_id();
        account.positions.insert(a, position(Status::Open, 5.0));
        account.positions.insert(b, position(Status::Open, -2.0));
        assert_eq!(account.current_equity(), 103.0);
        account.record_curve();
        assert_eq!(account.balances, vec![100.0]);
        assert_eq!(account.equity, vec![103.0]);
        assert_eq!(account.final_equity(), 103.0);
    }

    #[test]
    fn locate_finds_each_map() {
        let mut account = Account::new(PeriodId(0), vec![], 0.0);
        let p = account.allocate_id();
        let o = account.allocate_id();
        let h = account.allocate_id();
        account.pending.insert(p, position(Status::Pending, 0.0));
        account.positions.insert(o, position(Status::Open, 0.0));
        account.history.insert(h, position(Status::NotTaken, 0.0));
        assert_eq!(account.locate(p), Some(Location::Pending));
        assert_eq!(account.locate(o), Some(Location::Open));
        assert_eq!(account.locate(h), Some(Location::History));
        assert_eq!(account.locate(PositionId(99)), None);
        assert!(!account.is_finalized());
        assert_eq!(account.count_status(Status::NotTaken), 1);
    }
}
