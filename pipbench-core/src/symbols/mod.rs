//! Symbol resolution and currency conversion.

pub mod graph;
pub mod pip;

pub use graph::{required_symbols, Hop, SymbolGraph};
pub use pip::{pip_size, pip_value, to_pips, JPY_PIP_SIZE, PIP_SIZE};
