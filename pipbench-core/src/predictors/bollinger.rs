//! Bollinger-band mean reversion.
//!
//! Keeps a rolling window of recent highs and lows per symbol. An open above
//! `mean + k·σ` sells back toward the band, an open below `mean - k·σ` buys.
//! Uses population standard deviation.

use super::Predictor;
use crate::domain::{Bar, Direction, Order, Symbol};
use crate::symbols::pip_size;
use std::collections::{BTreeMap, VecDeque};

#[derive(Debug, Clone)]
pub struct Bollinger {
    window: usize,
    multiplier: f64,
    take_profit_pips: f64,
    samples: BTreeMap<Symbol, VecDeque<f64>>,
}

impl Bollinger {
    /// `window` counts samples; each bar contributes two (high and low).
    pub fn new(window: usize, multiplier: f64, take_profit_pips: f64) -> Self {
        Self {
            window: window.max(2),
            multiplier,
            take_profit_pips,
            samples: BTreeMap::new(),
        }
    }

    fn record(&mut self, bar: &Bar) -> (f64, f64) {
        let samples = self.samples.entry(bar.symbol).or_default();
        samples.push_back(bar.high);
        samples.push_back(bar.low);
        while samples.len() > self.window {
            samples.pop_front();
        }
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
        (mean, variance.sqrt())
    }
}

impl Predictor for Bollinger {
    fn name(&self) -> &str {
        "bollinger"
    }

    fn on_period_start(&mut self, bars: &[Bar]) {
        self.samples.clear();
        for bar in bars {
            self.samples
                .insert(bar.symbol, VecDeque::from([bar.high, bar.low]));
        }
    }

    fn on_bar(&mut self, bars: &[Bar]) -> Option<Vec<Order>> {
        let mut orders = Vec::with_capacity(bars.len());
        for bar in bars {
            let (mean, sigma) = self.record(bar);
            let band = self.multiplier * sigma;
            let distance = self.take_profit_pips * pip_size(bar.symbol);
            let order = if bar.open > mean + band && bar.close - distance > 0.0 {
                Order::market(bar.symbol, Direction::Sell).with_take_profit(bar.close - distance)
            } else if bar.open < mean - band {
                Order::market(bar.symbol, Direction::Buy).with_take_profit(bar.close + distance)
            } else {
                Order::market(bar.symbol, Direction::DontBuy)
            };
            orders.push(order);
        }
        Some(orders)
    }

    fn on_period_end(&mut self) {
        self.samples.clear();
    }
}
