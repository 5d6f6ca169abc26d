//! Fixed take-profit on both legs, registered as `static`.

use super::Predictor;
use crate::domain::{Bar, Direction, Order};
use crate::symbols::pip_size;

/// Every minute, opens a BUY and a SELL on every symbol, each with a
/// take-profit `take_profit_pips` away from the close.
#[derive(Debug, Clone)]
pub struct FixedTarget {
    take_profit_pips: f64,
}

impl FixedTarget {
    pub fn new(take_profit_pips: f64) -> Self {
        Self { take_profit_pips }
    }
}

impl Predictor for FixedTarget {
    fn name(&self) -> &str {
        "static"
    }

    fn on_bar(&mut self, bars: &[Bar]) -> Option<Vec<Order>> {
        let mut orders = Vec::with_capacity(bars.len() * 2);
        for bar in bars {
            let distance = self.take_profit_pips * pip_size(bar.symbol);
            orders.push(Order::market(bar.symbol, Direction::Buy).with_take_profit(bar.close + distance));
            let target = bar.close - distance;
            if target > 0.0 {
                orders.push(Order::market(bar.symbol, Direction::Sell).with_take_profit(target));
            }
        }
        Some(orders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Symbol;
    use chrono::{TimeZone, Utc};

    #[test]
    fn targets_scale_with_pip_size() {
        let ts = Utc.timestamp_opt(1_600_000_000, 0).unwrap();
        let bars = vec![
            Bar::flat(Symbol::new("EURUSD").unwrap(), ts, 1.1),
            Bar::flat(Symbol::new("USDJPY").unwrap(), ts, 100.0),
        ];
        let orders = FixedTarget::new(100.0).on_bar(&bars).unwrap();
        assert_eq!(orders.len(), 4);
        assert!((orders[0].take_profit.unwrap() - 1.11).abs() < 1e-12);
        assert!((orders[1].take_profit.unwrap() - 1.09).abs() < 1e-12);
        assert!((orders[2].take_profit.unwrap() - 101.0).abs() < 1e-9);
        assert_eq!(orders[3].direction, Direction::Sell);
    }
}
