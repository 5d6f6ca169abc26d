//! Position ledger: the per-period order/position state machine.
//!
//! ```text
//!   Order ──DONT_*──────────────────────────────► NOT_TAKEN
//!     │
//!     ├─market / limit satisfied at close──► OPEN ──SL / TP / expiry / period end──► CLOSED_*
//!     │                                       ▲
//!     └─limit not yet met──► PENDING ─trigger─┘
//!                               └──expiry / period end──► NOT_TAKEN
//! ```
//!
//! Every transition moves the record between the account's `pending`,
//! `positions` and `history` maps with a single remove followed by a single
//! insert, so an id is never visible in two maps.

use super::fills::{entry_fill, exit_fill, satisfied_at};
use crate::domain::{Account, Bar, Currency, Frame, Order, Position, PositionId, Status};
use crate::error::{CoreError, CoreResult};
use crate::symbols::{pip_size, SymbolGraph};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::trace;

/// Applies the transition rules to an [`Account`].
///
/// The ledger is stateless apart from its pricing context; all mutable state
/// lives in the account it is handed.
#[derive(Debug, Clone)]
pub struct PositionLedger {
    graph: Arc<SymbolGraph>,
    account_currency: Currency,
    lot_size: f64,
}

impl PositionLedger {
    pub fn new(graph: Arc<SymbolGraph>, account_currency: Currency, lot_size: f64) -> CoreResult<Self> {
        if !lot_size.is_finite() || lot_size <= 0.0 {
            return Err(CoreError::validation(format!(
                "lot size must be positive, got {lot_size}"
            )));
        }
        Ok(Self {
            graph,
            account_currency,
            lot_size,
        })
    }

    pub fn graph(&self) -> &SymbolGraph {
        &self.graph
    }

    pub fn account_currency(&self) -> Currency {
        self.account_currency
    }

    /// Account-currency value of a position at `rate`.
    pub fn value(&self, position: &Position, rate: f64) -> f64 {
        let pip_value = position.pip_value.unwrap_or(0.0);
        position.order.direction.sign() * rate / pip_size(position.order.symbol) * pip_value
    }

    /// Ingest one sanitized order placed at `minute`.
    ///
    /// DONT_* orders go straight to history as NOT_TAKEN. Market orders and
    /// limits already satisfied by the close open immediately at the close.
    /// Anything else waits in `pending` until triggered or expired.
    pub fn place(
        &self,
        account: &mut Account,
        order: &Order,
        minute: usize,
        frame: &Frame,
        window: Bar,
        hold_minutes: Option<usize>,
    ) -> CoreResult<PositionId> {
        let close = frame.require(order.symbol)?.close;
        let id = account.allocate_id();
        let expiry = hold_minutes.and_then(|hold| minute.checked_add(hold));
        let mut position = Position::pending(order.clone(), window, frame.timestamp, expiry);

        if !order.direction.is_actionable() {
            position.status = Status::NotTaken;
            account.history.insert(id, position);
            return Ok(id);
        }

        let immediate = match order.open_bid {
            None => true,
            Some(bid) => satisfied_at(order.direction, bid, close),
        };
        account.pending.insert(id, position);
        if immediate {
            self.open_position(account, id, frame, close)?;
        }
        Ok(id)
    }

    /// PENDING → OPEN at `open_rate`. Fixes the pip value for the life of the position.
    pub fn open_position(
        &self,
        account: &mut Account,
        id: PositionId,
        frame: &Frame,
        open_rate: f64,
    ) -> CoreResult<()> {
        if !open_rate.is_finite() || open_rate <= 0.0 {
            return Err(CoreError::validation(format!(
                "cannot open {id} at rate {open_rate}"
            )));
        }
        let pending = account
            .pending
            .get(&id)
            .ok_or_else(|| CoreError::state(format!("cannot open {id}: not pending")))?;
        let symbol = pending.order.symbol;
        let pip_value = self
            .graph
            .pip_value(symbol, self.account_currency, self.lot_size, frame)?;
        let close = frame.require(symbol)?.close;

        let Some(mut position) = account.pending.remove(&id) else {
            return Err(CoreError::state(format!("cannot open {id}: not pending")));
        };
        position.status = Status::Open;
        position.open_time = Some(frame.timestamp);
        position.open_rate = Some(open_rate);
        position.pip_value = Some(pip_value);
        position.initial_value = self.value(&position, open_rate);
        position.held_value = self.value(&position, close) - position.initial_value;
        trace!(%id, %symbol, open_rate, "opened");
        account.positions.insert(id, position);
        Ok(())
    }

    /// OPEN → closed-family. Realizes the position into the balance.
    pub fn close_position(
        &self,
        account: &mut Account,
        id: PositionId,
        status: Status,
        close_rate: f64,
        time: DateTime<Utc>,
    ) -> CoreResult<()> {
        if !status.is_closed() {
            return Err(CoreError::state(format!(
                "cannot close {id} with non-terminal status {status}"
            )));
        }
        if !close_rate.is_finite() || close_rate <= 0.0 {
            return Err(CoreError::validation(format!(
                "cannot close {id} at rate {close_rate}"
            )));
        }
        let open = account
            .positions
            .get(&id)
            .ok_or_else(|| CoreError::state(format!("cannot close {id}: not open")))?;
        if open.open_time.is_some_and(|opened| time < opened) {
            return Err(CoreError::state(format!(
                "cannot close {id} before it opened"
            )));
        }

        let Some(mut position) = account.positions.remove(&id) else {
            return Err(CoreError::state(format!("cannot close {id}: not open")));
        };
        position.status = status;
        position.close_time = Some(time);
        position.close_rate = Some(close_rate);
        position.final_value = self.value(&position, close_rate);
        position.held_value = position.realized();
        account.balance += position.realized();
        trace!(%id, %status, close_rate, "closed");
        account.history.insert(id, position);
        Ok(())
    }

    /// PENDING → NOT_TAKEN.
    pub fn reject(&self, account: &mut Account, id: PositionId) -> CoreResult<()> {
        let mut position = account
            .pending
            .remove(&id)
            .ok_or_else(|| CoreError::state(format!("cannot reject {id}: not pending")))?;
        position.status = Status::NotTaken;
        account.history.insert(id, position);
        Ok(())
    }

    /// Process one minute: pending triggers and expiries, exits for open
    /// positions (not in the minute they opened), mark-to-market, then one
    /// point on the balance and equity curves.
    pub fn step(&self, account: &mut Account, minute: usize, frame: &Frame) -> CoreResult<()> {
        let mut opened_now = BTreeSet::new();
        let pending: Vec<PositionId> = account.pending.keys().copied().collect();
        for id in pending {
            let Some(position) = account.pending.get(&id) else {
                continue;
            };
            let bar = frame.require(position.order.symbol)?;
            let fill = match position.order.open_bid {
                Some(bid) => entry_fill(position.order.direction, bid, bar),
                None => Some(bar.open),
            };
            let expired = position.is_expired_at(minute);
            match fill {
                Some(rate) => {
                    self.open_position(account, id, frame, rate)?;
                    opened_now.insert(id);
                }
                None if expired => self.reject(account, id)?,
                None => {}
            }
        }

        let open: Vec<PositionId> = account.positions.keys().copied().collect();
        for id in open {
            let Some(position) = account.positions.get(&id) else {
                continue;
            };
            let bar = frame.require(position.order.symbol)?;
            let exit = if opened_now.contains(&id) {
                None
            } else {
                exit_fill(
                    position.order.direction,
                    position.order.take_profit,
                    position.order.stop_loss,
                    bar,
                )
            };
            let exit = exit.or_else(|| {
                position
                    .is_expired_at(minute)
                    .then_some((Status::ClosedTimeout, bar.close))
            });
            if let Some((status, rate)) = exit {
                self.close_position(account, id, status, rate, frame.timestamp)?;
            }
        }

        self.mark_to_market(account, frame)?;
        account.record_curve();
        Ok(())
    }

    /// Re-value every open position at the frame's closes.
    pub fn mark_to_market(&self, account: &mut Account, frame: &Frame) -> CoreResult<()> {
        let mut marks = Vec::with_capacity(account.positions.len());
        for (&id, position) in &account.positions {
            let close = frame.require(position.order.symbol)?.close;
            marks.push((id, self.value(position, close) - position.initial_value));
        }
        for (id, held) in marks {
            if let Some(position) = account.positions.get_mut(&id) {
                position.held_value = held;
            }
        }
        Ok(())
    }

    /// End of period: pending → NOT_TAKEN, open → CLOSED_END_OF_PERIOD at the
    /// final close. Restates the last curve point with the realized balance.
    pub fn finalize(&self, account: &mut Account, frame: &Frame) -> CoreResult<()> {
        let pending: Vec<PositionId> = account.pending.keys().copied().collect();
        for id in pending {
            self.reject(account, id)?;
        }
        let open: Vec<PositionId> = account.positions.keys().copied().collect();
        for id in open {
            let symbol = match account.positions.get(&id) {
                Some(position) => position.order.symbol,
                None => continue,
            };
            let close = frame.require(symbol)?.close;
            self.close_position(account, id, Status::ClosedEndOfPeriod, close, frame.timestamp)?;
        }
        account.restate_last_point();
        Ok(())
    }
}
