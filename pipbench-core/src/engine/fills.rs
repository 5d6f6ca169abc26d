//! Trigger checks against one minute's OHLC range.
//!
//! Fill prices never assume a lucky path through the bar: a level that the
//! open has already gapped through fills at the open, and when a stop-loss and
//! a take-profit are both inside the range the stop-loss is taken.

use crate::domain::{Bar, Direction, Status};

/// Whether a limit entry is already satisfied by the placement minute's close.
pub fn satisfied_at(direction: Direction, open_bid: f64, close: f64) -> bool {
    match direction {
        Direction::Buy => open_bid >= close,
        Direction::Sell => open_bid <= close,
        Direction::DontBuy | Direction::DontSell => false,
    }
}

/// Entry fill for a pending limit order, if the bar reaches `open_bid`.
///
/// Buy: triggers when `low <= bid`, fills at `min(open, bid)`.
/// Sell: triggers when `high >= bid`, fills at `max(open, bid)`.
pub fn entry_fill(direction: Direction, open_bid: f64, bar: &Bar) -> Option<f64> {
    match direction {
        Direction::Buy if bar.low <= open_bid => Some(bar.open.min(open_bid)),
        Direction::Sell if bar.high >= open_bid => Some(bar.open.max(open_bid)),
        _ => None,
    }
}

/// Exit for an open position, stop-loss checked first.
pub fn exit_fill(
    direction: Direction,
    take_profit: Option<f64>,
    stop_loss: Option<f64>,
    bar: &Bar,
) -> Option<(Status, f64)> {
    if let Some(sl) = stop_loss {
        if let Some(price) = adverse_touch(direction, sl, bar) {
            return Some((Status::ClosedStopLoss, price));
        }
    }
    if let Some(tp) = take_profit {
        if let Some(price) = favourable_touch(direction, tp, bar) {
            return Some((Status::ClosedTakeProfit, price));
        }
    }
    None
}

fn adverse_touch(direction: Direction, level: f64, bar: &Bar) -> Option<f64> {
    match direction {
        Direction::Buy if bar.low <= level => Some(bar.open.min(level)),
        Direction::Sell if bar.high >= level => Some(bar.open.max(level)),
        _ => None,
    }
}

fn favourable_touch(direction: Direction, level: f64, bar: &Bar) -> Option<f64> {
    match direction {
        Direction::Buy if bar.high >= level => Some(bar.open.max(level)),
        Direction::Sell if bar.low <= level => Some(bar.open.min(level)),
        _ => None,
    }
}
