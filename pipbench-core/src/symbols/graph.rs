//! Currency conversion graph over the available market-data symbols.
//!
//! Every available symbol is an undirected edge between its two currencies.
//! Conversions follow the shortest chain of edges (breadth-first search over
//! ordered adjacency maps, so the chosen chain is deterministic).

use crate::domain::{Bar, Currency, Frame, Symbol};
use crate::error::{CoreError, CoreResult};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// One step along a conversion chain.
///
/// Walking a hop from `symbol.base()` to `symbol.quote()` multiplies by the
/// symbol's rate; walking it the other way (`inverted`) divides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hop {
    pub symbol: Symbol,
    pub inverted: bool,
}

impl Hop {
    fn apply(&self, rate: f64) -> f64 {
        if self.inverted {
            1.0 / rate
        } else {
            rate
        }
    }
}

/// Undirected reachability structure over currency codes.
#[derive(Debug, Clone)]
pub struct SymbolGraph {
    symbols: BTreeSet<Symbol>,
    adjacency: BTreeMap<Currency, BTreeMap<Currency, Hop>>,
}

impl SymbolGraph {
    /// Build the graph from the available data universe.
    pub fn new(available: &[Symbol]) -> CoreResult<Self> {
        if available.is_empty() {
            return Err(CoreError::validation(
                "available symbol universe must not be empty",
            ));
        }
        let symbols: BTreeSet<Symbol> = available.iter().copied().collect();
        let mut adjacency: BTreeMap<Currency, BTreeMap<Currency, Hop>> = BTreeMap::new();

        // Direct edges first so a listed pair is never shadowed by its inverse.
        for &symbol in &symbols {
            adjacency
                .entry(symbol.base())
                .or_default()
                .entry(symbol.quote())
                .or_insert(Hop {
                    symbol,
                    inverted: false,
                });
        }
        for &symbol in &symbols {
            adjacency
                .entry(symbol.quote())
                .or_default()
                .entry(symbol.base())
                .or_insert(Hop {
                    symbol,
                    inverted: true,
                });
        }

        Ok(Self { symbols, adjacency })
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn contains(&self, symbol: Symbol) -> bool {
        self.symbols.contains(&symbol)
    }

    pub fn symbols(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.symbols.iter().copied()
    }

    /// Shortest conversion chain from one currency to another.
    ///
    /// Returns an empty chain when `from == to` and `None` when the
    /// currencies are not connected.
    pub fn path(&self, from: Currency, to: Currency) -> Option<Vec<Hop>> {
        if from == to {
            return Some(Vec::new());
        }
        if !self.adjacency.contains_key(&from) || !self.adjacency.contains_key(&to) {
            return None;
        }

        let mut came_from: BTreeMap<Currency, (Currency, Hop)> = BTreeMap::new();
        let mut queue = VecDeque::from([from]);
        let mut seen = BTreeSet::from([from]);

        while let Some(current) = queue.pop_front() {
            if current == to {
                break;
            }
            let Some(neighbours) = self.adjacency.get(&current) else {
                continue;
            };
            for (&next, &hop) in neighbours {
                if seen.insert(next) {
                    came_from.insert(next, (current, hop));
                    queue.push_back(next);
                }
            }
        }

        let mut chain = Vec::new();
        let mut cursor = to;
        while cursor != from {
            let (prev, hop) = came_from.get(&cursor)?;
            chain.push(*hop);
            cursor = *prev;
        }
        chain.reverse();
        Some(chain)
    }

    /// The chain that prices `symbol`: itself if available, otherwise the
    /// shortest chain from its base to its quote currency.
    pub fn chain(&self, symbol: Symbol) -> Option<Vec<Hop>> {
        if self.contains(symbol) {
            return Some(vec![Hop {
                symbol,
                inverted: false,
            }]);
        }
        self.path(symbol.base(), symbol.quote())
    }

    /// Whether `symbol` can be priced from the available data.
    pub fn is_reachable(&self, symbol: Symbol) -> bool {
        self.chain(symbol).is_some()
    }

    /// Minimal set of available symbols needed to price every requested symbol.
    ///
    /// Unreachable symbols are filtered out, not reported as errors.
    pub fn required_symbols(&self, requested: &[Symbol]) -> CoreResult<BTreeSet<Symbol>> {
        if requested.is_empty() {
            return Err(CoreError::validation(
                "requested symbol set must not be empty",
            ));
        }
        let mut required = BTreeSet::new();
        for &symbol in requested {
            if let Some(chain) = self.chain(symbol) {
                required.extend(chain.iter().map(|hop| hop.symbol));
            }
        }
        Ok(required)
    }

    /// Multiplier converting an amount in `from` into `to` at the frame's closes.
    pub fn conversion_rate(&self, from: Currency, to: Currency, frame: &Frame) -> CoreResult<f64> {
        let chain = self.path(from, to).ok_or_else(|| {
            CoreError::validation(format!("no conversion path from {from} to {to}"))
        })?;
        let mut rate = 1.0;
        for hop in &chain {
            let close = frame.require(hop.symbol)?.close;
            rate *= hop.apply(close);
        }
        Ok(rate)
    }

    /// Price `symbol` for the frame's minute by composing its chain's bars.
    ///
    /// Inverted legs swap high and low, so the composed range still brackets
    /// the composed open and close.
    pub fn derive_bar(&self, symbol: Symbol, frame: &Frame) -> CoreResult<Bar> {
        if let Some(bar) = frame.bar(symbol) {
            return Ok(bar.clone());
        }
        let chain = self
            .chain(symbol)
            .ok_or_else(|| CoreError::validation(format!("{symbol} is not reachable")))?;

        let mut out = Bar::flat(symbol, frame.timestamp, 1.0);
        for hop in &chain {
            let leg = frame.require(hop.symbol)?;
            let (high, low) = if hop.inverted {
                (leg.low, leg.high)
            } else {
                (leg.high, leg.low)
            };
            out.open *= hop.apply(leg.open);
            out.high *= hop.apply(high);
            out.low *= hop.apply(low);
            out.close *= hop.apply(leg.close);
        }
        Ok(out)
    }
}

/// Minimal set of `available` symbols needed to price every `requested` symbol.
pub fn required_symbols(requested: &[Symbol], available: &[Symbol]) -> CoreResult<BTreeSet<Symbol>> {
    if requested.is_empty() {
        return Err(CoreError::validation(
            "requested symbol set must not be empty",
        ));
    }
    SymbolGraph::new(available)?.required_symbols(requested)
}
