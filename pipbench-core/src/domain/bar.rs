//! Bar and Frame: the fundamental market data units.

use super::symbol::Symbol;
use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One minute of OHLC data for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub symbol: Symbol,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Bar {
    /// Basic OHLC sanity check: finite, positive, high >= low, open/close inside the range.
    pub fn is_sane(&self) -> bool {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }

    /// Aggregate consecutive bars of one symbol into a single bar: first open,
    /// highest high, lowest low, last close, stamped with the first timestamp.
    pub fn aggregate<'a>(bars: impl IntoIterator<Item = &'a Bar>) -> Option<Bar> {
        let mut iter = bars.into_iter();
        let first = iter.next()?;
        let mut out = first.clone();
        for bar in iter {
            out.high = out.high.max(bar.high);
            out.low = out.low.min(bar.low);
            out.close = bar.close;
        }
        Some(out)
    }

    /// A zero-range bar at a single price, used when no future minutes exist.
    pub fn flat(symbol: Symbol, timestamp: DateTime<Utc>, price: f64) -> Bar {
        Bar {
            symbol,
            timestamp,
            open: price,
            high: price,
            low: price,
            close: price,
        }
    }
}

/// One synchronized minute: a bar for every symbol in the data set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub timestamp: DateTime<Utc>,
    pub bars: Vec<Bar>,
}

impl Frame {
    pub fn new(timestamp: DateTime<Utc>, bars: Vec<Bar>) -> Self {
        Self { timestamp, bars }
    }

    pub fn bar(&self, symbol: Symbol) -> Option<&Bar> {
        self.bars.iter().find(|b| b.symbol == symbol)
    }

    /// The bar for `symbol`, or a validation error naming the minute.
    pub fn require(&self, symbol: Symbol) -> CoreResult<&Bar> {
        self.bar(symbol).ok_or_else(|| {
            CoreError::validation(format!(
                "frame at {} has no bar for {symbol}",
                self.timestamp
            ))
        })
    }

    pub fn close(&self, symbol: Symbol) -> Option<f64> {
        self.bar(symbol).map(|b| b.close)
    }

    /// Bars for the given symbols, in the given order. Missing symbols are skipped.
    pub fn subset(&self, symbols: &[Symbol]) -> Vec<Bar> {
        symbols
            .iter()
            .filter_map(|s| self.bar(*s).cloned())
            .collect()
    }
}

/// Check that a run of frames is non-empty and strictly increasing in time.
pub fn validate_frames(frames: &[Frame]) -> CoreResult<()> {
    if frames.is_empty() {
        return Err(CoreError::data("no frames supplied"));
    }
    for pair in frames.windows(2) {
        if pair[1].timestamp <= pair[0].timestamp {
            return Err(CoreError::data(format!(
                "timestamps out of order: {} follows {}",
                pair[1].timestamp, pair[0].timestamp
            )));
        }
    }
    Ok(())
}
