//! Position lifecycle record and its status.

use super::bar::Bar;
use super::order::Order;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a position.
///
/// `Pending` and `Open` only ever appear on an in-progress account. Every
/// position in a finalized history carries `NotTaken` or one of the closed
/// statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    NotTaken,
    Pending,
    Open,
    ClosedTakeProfit,
    ClosedStopLoss,
    ClosedTimeout,
    ClosedEndOfPeriod,
}

impl Status {
    pub const ALL: [Status; 7] = [
        Status::NotTaken,
        Status::Pending,
        Status::Open,
        Status::ClosedTakeProfit,
        Status::ClosedStopLoss,
        Status::ClosedTimeout,
        Status::ClosedEndOfPeriod,
    ];

    pub const CLOSED: [Status; 4] = [
        Status::ClosedTakeProfit,
        Status::ClosedStopLoss,
        Status::ClosedTimeout,
        Status::ClosedEndOfPeriod,
    ];

    pub fn is_closed(self) -> bool {
        Self::CLOSED.contains(&self)
    }

    /// Terminal statuses may appear in history.
    pub fn is_terminal(self) -> bool {
        self == Status::NotTaken || self.is_closed()
    }

    pub fn name(self) -> &'static str {
        match self {
            Status::NotTaken => "NOT_TAKEN",
            Status::Pending => "PENDING",
            Status::Open => "OPEN",
            Status::ClosedTakeProfit => "CLOSED_TAKE_PROFIT",
            Status::ClosedStopLoss => "CLOSED_STOP_LOSS",
            Status::ClosedTimeout => "CLOSED_TIMEOUT",
            Status::ClosedEndOfPeriod => "CLOSED_END_OF_PERIOD",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The lifecycle record of one order.
///
/// `window` is the future bar (aggregated over the order's evaluation
/// horizon) the order was judged against; assessors use it to compute the
/// best and worst outcomes that were available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub order: Order,
    pub window: Bar,
    pub placed_at: DateTime<Utc>,
    /// Minute index (within the period) at which an unresolved order expires.
    pub expiry_minute: Option<usize>,
    pub status: Status,
    pub open_time: Option<DateTime<Utc>>,
    pub close_time: Option<DateTime<Utc>>,
    pub open_rate: Option<f64>,
    pub close_rate: Option<f64>,
    /// Account-currency value of one pip, fixed when the position opens.
    pub pip_value: Option<f64>,
    pub held_value: f64,
    pub initial_value: f64,
    pub final_value: f64,
}

impl Position {
    /// A fresh, not-yet-opened record for `order`.
    pub fn pending(
        order: Order,
        window: Bar,
        placed_at: DateTime<Utc>,
        expiry_minute: Option<usize>,
    ) -> Self {
        Self {
            order,
            window,
            placed_at,
            expiry_minute,
            status: Status::Pending,
            open_time: None,
            close_time: None,
            open_rate: None,
            close_rate: None,
            pip_value: None,
            held_value: 0.0,
            initial_value: 0.0,
            final_value: 0.0,
        }
    }

    /// Realized equity change attributed to this position.
    pub fn realized(&self) -> f64 {
        self.final_value - self.initial_value
    }

    pub fn is_expired_at(&self, minute: usize) -> bool {
        self.expiry_minute.is_some_and(|expiry| minute >= expiry)
    }
}
