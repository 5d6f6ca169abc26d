//! Momentum baseline: the last move, repeated.

use super::Predictor;
use crate::domain::{Bar, Direction, Order};

/// Predicts the same first-order difference again: a rising minute becomes a
/// BUY targeting `close + (close - open)`, a falling one a SELL targeting the
/// same. Flat minutes produce no order.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomWalk;

impl Predictor for RandomWalk {
    fn name(&self) -> &str {
        "random_walk"
    }

    fn on_bar(&mut self, bars: &[Bar]) -> Option<Vec<Order>> {
        let orders = bars
            .iter()
            .filter_map(|bar| {
                let diff = bar.close - bar.open;
                let target = bar.close + diff;
                let direction = if diff > 0.0 {
                    Direction::Buy
                } else if diff < 0.0 && target > 0.0 {
                    Direction::Sell
                } else {
                    return None;
                };
                Some(Order::market(bar.symbol, direction).with_take_profit(target))
            })
            .collect();
        Some(orders)
    }
}
