//! Coin-flip baseline.

use super::Predictor;
use crate::domain::{Bar, Direction, Order};
use rand::rngs::StdRng;
use rand::Rng;

/// Draws `u ~ U[0, 1)` per symbol per minute: BUY when `u >= 0.51`, SELL
/// when `u <= 0.49`, otherwise DONT_BUY. Market orders with no exits.
#[derive(Debug, Clone)]
pub struct RandomDirection {
    rng: StdRng,
}

impl RandomDirection {
    pub fn new(rng: StdRng) -> Self {
        Self { rng }
    }

    fn draw(&mut self) -> Direction {
        let u: f64 = self.rng.gen();
        if u >= 0.51 {
            Direction::Buy
        } else if u <= 0.49 {
            Direction::Sell
        } else {
            Direction::DontBuy
        }
    }
}

impl Predictor for RandomDirection {
    fn name(&self) -> &str {
        "random"
    }

    fn on_bar(&mut self, bars: &[Bar]) -> Option<Vec<Order>> {
        let orders = bars
            .iter()
            .map(|bar| Order::market(bar.symbol, self.draw()))
            .collect();
        Some(orders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Symbol;
    use chrono::{TimeZone, Utc};
    use rand::SeedableRng;

    fn bars() -> Vec<Bar> {
        let ts = Utc.timestamp_opt(1_600_000_000, 0).unwrap();
        vec![
            Bar::flat(Symbol::new("EURUSD").unwrap(), ts, 1.1),
            Bar::flat(Symbol::new("USDJPY").unwrap(), ts, 100.0),
        ]
    }

    #[test]
    fn same_seed_same_orders() {
        let mut a = RandomDirection::new(StdRng::seed_from_u64(9));
        let mut b = RandomDirection::new(StdRng::seed_from_u64(9));
        for _ in 0..20 {
            assert_eq!(a.on_bar(&bars()), b.on_bar(&bars()));
        }
    }

    #[test]
    fn one_market_order_per_bar() {
        let mut p = RandomDirection::new(StdRng::seed_from_u64(3));
        let orders = p.on_bar(&bars()).unwrap();
        assert_eq!(orders.len(), 2);
        assert!(orders.iter().all(|o| o.is_market() && o.take_profit.is_none()));
    }
}
