//! Fixed-horizon evaluation of an order batch.

use super::ledger::PositionLedger;
use crate::domain::{Account, Bar, Frame, Order, PeriodId, Position};
use crate::error::{CoreError, CoreResult};

impl PositionLedger {
    /// Evaluate `orders` placed at `origin` against the next `hold_minutes`
    /// frames of `future`.
    ///
    /// Returns exactly one terminal position per order, in input order. Each
    /// position's window is the aggregate of its symbol over the horizon.
    pub fn calculate_positions(
        &self,
        origin: &Frame,
        future: &[Frame],
        orders: &[Order],
        hold_minutes: usize,
    ) -> CoreResult<Vec<Position>> {
        if orders.is_empty() {
            return Err(CoreError::validation("order batch must not be empty"));
        }
        if hold_minutes == 0 {
            return Err(CoreError::validation("hold_minutes must be at least 1"));
        }
        if future.is_empty() {
            return Err(CoreError::data("no future frames to evaluate against"));
        }
        if future.len() < hold_minutes {
            return Err(CoreError::data(format!(
                "{} future frames is shorter than hold_minutes {hold_minutes}",
                future.len()
            )));
        }
        let horizon = &future[..hold_minutes];
        let mut last = origin.timestamp;
        for frame in horizon {
            if frame.timestamp <= last {
                return Err(CoreError::data(format!(
                    "timestamps must increase: {} follows {last}",
                    frame.timestamp
                )));
            }
            last = frame.timestamp;
        }

        let mut scratch = Account::new(PeriodId(0), Vec::new(), 0.0);
        let mut ids = Vec::with_capacity(orders.len());
        for order in orders {
            let window = horizon_window(order, origin, horizon)?;
            ids.push(self.place(&mut scratch, order, 0, origin, window, Some(hold_minutes))?);
        }
        for (offset, frame) in horizon.iter().enumerate() {
            self.step(&mut scratch, offset + 1, frame)?;
        }
        if let Some(end) = horizon.last() {
            self.finalize(&mut scratch, end)?;
        }

        ids.into_iter()
            .map(|id| {
                scratch
                    .history
                    .remove(&id)
                    .ok_or_else(|| CoreError::state(format!("{id} did not reach history")))
            })
            .collect()
    }
}

fn horizon_window(order: &Order, origin: &Frame, horizon: &[Frame]) -> CoreResult<Bar> {
    let bars: Vec<&Bar> = horizon.iter().filter_map(|f| f.bar(order.symbol)).collect();
    match Bar::aggregate(bars) {
        Some(window) => Ok(window),
        None => {
            let close = origin.require(order.symbol)?.close;
            Ok(Bar::flat(order.symbol, origin.timestamp, close))
        }
    }
}
