//! Order sanitization.
//!
//! Predictor output is untrusted. Each step it is normalized into exactly two
//! orders per tradable symbol, one per leg, in tradable-symbol order with the
//! buy leg first.

use crate::domain::{Leg, Order, Symbol};
use crate::error::{CoreError, CoreResult};
use std::collections::{BTreeMap, BTreeSet};
use tracing::trace;

/// Normalize a raw order list against the tradable symbol set.
///
/// `None` means "no intents" and yields the full neutral set. For each
/// `(symbol, leg)` the first BUY/SELL order wins over any DONT_* order and
/// later duplicates are dropped. Legs with no order are back-filled with
/// DONT_BUY / DONT_SELL.
pub fn sanitize_orders(symbols: &[Symbol], orders: Option<&[Order]>) -> CoreResult<Vec<Order>> {
    if symbols.is_empty() {
        return Err(CoreError::validation("tradable symbol set must not be empty"));
    }

    let mut seen = BTreeSet::new();
    let tradable: Vec<Symbol> = symbols.iter().copied().filter(|s| seen.insert(*s)).collect();

    let mut slots: BTreeMap<(Symbol, Leg), Order> = BTreeMap::new();
    for order in orders.unwrap_or_default() {
        check_well_formed(order, &seen)?;
        let key = (order.symbol, order.direction.leg());
        match slots.get(&key) {
            None => {
                slots.insert(key, strip(order));
            }
            Some(kept) if !kept.direction.is_actionable() && order.direction.is_actionable() => {
                slots.insert(key, strip(order));
            }
            Some(_) => trace!(symbol = %order.symbol, direction = %order.direction, "collapsed duplicate order"),
        }
    }

    let mut out = Vec::with_capacity(tradable.len() * 2);
    for symbol in tradable {
        for leg in [Leg::Buy, Leg::Sell] {
            out.push(
                slots
                    .remove(&(symbol, leg))
                    .unwrap_or_else(|| Order::neutral(symbol, leg)),
            );
        }
    }
    Ok(out)
}

fn check_well_formed(order: &Order, tradable: &BTreeSet<Symbol>) -> CoreResult<()> {
    if !tradable.contains(&order.symbol) {
        return Err(CoreError::validation(format!(
            "order for {} which is not tradable",
            order.symbol
        )));
    }
    if !order.direction.is_actionable() {
        return Ok(());
    }
    let prices = [
        ("open_bid", order.open_bid),
        ("take_profit", order.take_profit),
        ("stop_loss", order.stop_loss),
    ];
    for (name, price) in prices {
        if let Some(p) = price {
            if !p.is_finite() || p <= 0.0 {
                return Err(CoreError::validation(format!(
                    "{} {} order has invalid {name} {p}",
                    order.symbol, order.direction
                )));
            }
        }
    }
    Ok(())
}

/// DONT_* orders carry no prices.
fn strip(order: &Order) -> Order {
    if order.direction.is_actionable() {
        order.clone()
    } else {
        Order::market(order.symbol, order.direction)
    }
}
