//! Orders issued by predictors.

use super::symbol::Symbol;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A predictor's decision for one leg of one symbol.
///
/// `DontBuy`/`DontSell` are explicit "no position" predictions: they are
/// recorded (as NOT_TAKEN) so they can be assessed like any other order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Buy,
    Sell,
    DontBuy,
    DontSell,
}

/// The two independent legs a symbol can be traded on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Leg {
    Buy,
    Sell,
}

impl Direction {
    pub fn leg(self) -> Leg {
        match self {
            Direction::Buy | Direction::DontBuy => Leg::Buy,
            Direction::Sell | Direction::DontSell => Leg::Sell,
        }
    }

    /// True for BUY and SELL, false for the DONT_* pair.
    pub fn is_actionable(self) -> bool {
        matches!(self, Direction::Buy | Direction::Sell)
    }

    /// +1 for the buy leg, -1 for the sell leg.
    pub fn sign(self) -> f64 {
        match self.leg() {
            Leg::Buy => 1.0,
            Leg::Sell => -1.0,
        }
    }
}

impl Leg {
    /// The neutral direction used to back-fill a leg with no intent.
    pub fn neutral(self) -> Direction {
        match self {
            Leg::Buy => Direction::DontBuy,
            Leg::Sell => Direction::DontSell,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Buy => "BUY",
            Direction::Sell => "SELL",
            Direction::DontBuy => "DONT_BUY",
            Direction::DontSell => "DONT_SELL",
        };
        f.write_str(name)
    }
}

/// A predictor's instruction for one symbol at one instant.
///
/// `open_bid` is a limit price; `None` means a market order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub symbol: Symbol,
    pub direction: Direction,
    pub open_bid: Option<f64>,
    pub take_profit: Option<f64>,
    pub stop_loss: Option<f64>,
}

impl Order {
    pub fn market(symbol: Symbol, direction: Direction) -> Self {
        Self {
            symbol,
            direction,
            open_bid: None,
            take_profit: None,
            stop_loss: None,
        }
    }

    pub fn neutral(symbol: Symbol, leg: Leg) -> Self {
        Self::market(symbol, leg.neutral())
    }

    pub fn with_open_bid(mut self, price: f64) -> Self {
        self.open_bid = Some(price);
        self
    }

    pub fn with_take_profit(mut self, price: f64) -> Self {
        self.take_profit = Some(price);
        self
    }

    pub fn with_stop_loss(mut self, price: f64) -> Self {
        self.stop_loss = Some(price);
        self
    }

    pub fn is_market(&self) -> bool {
        self.open_bid.is_none()
    }
}
