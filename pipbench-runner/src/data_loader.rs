//! Market data loading for the runner.
//!
//! Two sources:
//! 1. A CSV file of minute bars (`timestamp,symbol,open,high,low,close`),
//!    timestamps in RFC 3339 or unix seconds
//! 2. A seeded random walk per symbol, for demos and tests
//!
//! Both produce [`MarketData`]: one time series per symbol. Aligning the series
//! into frames happens later, once the run knows which symbols it needs, so a
//! gap in an unused symbol never costs a minute.

use chrono::{DateTime, Duration, TimeZone, Utc};
use pipbench_core::domain::{Bar, Frame, Symbol};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: {reason}")]
    Row { row: usize, reason: String },
    #[error("no market data rows")]
    Empty,
}

/// One CSV record.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CsvRow {
    timestamp: String,
    symbol: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
}

/// Per-symbol minute series, keyed by timestamp.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketData {
    series: BTreeMap<Symbol, BTreeMap<DateTime<Utc>, Bar>>,
}

impl MarketData {
    /// Insert one bar, rejecting a second bar for the same symbol and minute.
    pub fn insert(&mut self, bar: Bar) -> Result<(), String> {
        let series = self.series.entry(bar.symbol).or_default();
        if series.contains_key(&bar.timestamp) {
            return Err(format!("duplicate bar for {} at {}", bar.symbol, bar.timestamp));
        }
        series.insert(bar.timestamp, bar);
        Ok(())
    }

    /// The declared universe: every symbol with at least one bar.
    pub fn available(&self) -> Vec<Symbol> {
        self.series.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn bar_count(&self) -> usize {
        self.series.values().map(BTreeMap::len).sum()
    }

    /// Align `symbols` into frames, dropping every minute in which any of them
    /// has no bar. Bars inside a frame follow `symbols`' sorted order.
    pub fn frames(&self, symbols: &BTreeSet<Symbol>) -> Vec<Frame> {
        let Some(first) = symbols.iter().next() else {
            return Vec::new();
        };
        let Some(anchor) = self.series.get(first) else {
            return Vec::new();
        };

        let mut frames = Vec::with_capacity(anchor.len());
        let mut dropped = 0usize;
        'minutes: for &timestamp in anchor.keys() {
            let mut bars = Vec::with_capacity(symbols.len());
            for symbol in symbols {
                match self.series.get(symbol).and_then(|s| s.get(&timestamp)) {
                    Some(bar) => bars.push(bar.clone()),
                    None => {
                        dropped += 1;
                        continue 'minutes;
                    }
                }
            }
            frames.push(Frame::new(timestamp, bars));
        }
        if dropped > 0 {
            debug!(dropped, kept = frames.len(), "dropped incomplete minutes");
        }
        frames
    }
}

/// Load minute bars from a CSV file.
pub fn load_csv(path: &Path) -> Result<MarketData, LoadError> {
    let reader = csv::Reader::from_path(path)?;
    let data = read_rows(reader)?;
    info!(
        path = %path.display(),
        symbols = data.series.len(),
        bars = data.bar_count(),
        "loaded market data"
    );
    Ok(data)
}

/// Parse minute bars from any CSV reader with a header row.
pub fn read_csv<R: io::Read>(input: R) -> Result<MarketData, LoadError> {
    read_rows(csv::Reader::from_reader(input))
}

fn read_rows<R: io::Read>(mut reader: csv::Reader<R>) -> Result<MarketData, LoadError> {
    let mut data = MarketData::default();
    for (i, record) in reader.deserialize::<CsvRow>().enumerate() {
        // Data rows start after the header.
        let row = i + 2;
        let record = record?;
        let bar = parse_row(record).map_err(|reason| LoadError::Row { row, reason })?;
        data.insert(bar).map_err(|reason| LoadError::Row { row, reason })?;
    }
    if data.is_empty() {
        return Err(LoadError::Empty);
    }
    Ok(data)
}

fn parse_row(row: CsvRow) -> Result<Bar, String> {
    let symbol = Symbol::new(row.symbol.trim()).map_err(|e| e.to_string())?;
    let timestamp = parse_timestamp(row.timestamp.trim())?;
    let bar = Bar {
        symbol,
        timestamp,
        open: row.open,
        high: row.high,
        low: row.low,
        close: row.close,
    };
    if !bar.is_sane() {
        return Err(format!(
            "{symbol} bar at {timestamp} is not a valid OHLC bar ({} {} {} {})",
            bar.open, bar.high, bar.low, bar.close
        ));
    }
    Ok(bar)
}

/// RFC 3339, or whole unix seconds.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    raw.parse::<i64>()
        .ok()
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
        .ok_or_else(|| format!("unrecognised timestamp '{raw}'"))
}

/// Write every bar as CSV, ordered by timestamp then symbol.
pub fn write_csv<W: io::Write>(data: &MarketData, output: W) -> Result<(), LoadError> {
    let mut rows: Vec<&Bar> = data.series.values().flat_map(BTreeMap::values).collect();
    rows.sort_by(|a, b| (a.timestamp, a.symbol).cmp(&(b.timestamp, b.symbol)));

    let mut writer = csv::Writer::from_writer(output);
    for bar in rows {
        writer.serialize(CsvRow {
            timestamp: bar.timestamp.to_rfc3339(),
            symbol: bar.symbol.to_string(),
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
        })?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Typical starting level for a synthetic series.
fn starting_price(symbol: Symbol) -> f64 {
    if symbol.is_jpy_quoted() {
        100.0
    } else {
        1.0
    }
}

/// Generate `minutes` of synthetic bars for each symbol.
///
/// Each symbol walks independently from its own generator, seeded from `seed`
/// and the symbol id, so adding a symbol never changes another's series.
pub fn synthetic(symbols: &[Symbol], minutes: usize, seed: u64, start: DateTime<Utc>) -> MarketData {
    let mut data = MarketData::default();
    for &symbol in symbols {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&seed.to_le_bytes());
        hasher.update(symbol.to_string().as_bytes());
        let mut rng = StdRng::from_seed(*hasher.finalize().as_bytes());

        let mut price = starting_price(symbol);
        let series = data.series.entry(symbol).or_default();
        for i in 0..minutes {
            let timestamp = start + Duration::minutes(i as i64);
            let step: f64 = rng.gen_range(-0.0005..0.0005);
            let open = price;
            let close = price * (1.0 + step);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.0002));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.0002));
            series.insert(
                timestamp,
                Bar {
                    symbol,
                    timestamp,
                    open,
                    high,
                    low,
                    close,
                },
            );
            price = close;
        }
    }
    data
}
