//! Pip size and pip value.
//!
//! Yen-quoted pairs are priced to two decimal places, every other pair to
//! four, so a pip is `0.01` for `xxxJPY` and `0.0001` otherwise. This changes
//! the scale of every profit/loss figure on JPY-quoted symbols.

use super::graph::SymbolGraph;
use crate::domain::{Currency, Frame, Symbol};
use crate::error::{CoreError, CoreResult};

pub const PIP_SIZE: f64 = 0.0001;
pub const JPY_PIP_SIZE: f64 = 0.01;

/// The minimal price increment for `symbol`.
pub fn pip_size(symbol: Symbol) -> f64 {
    if symbol.is_jpy_quoted() {
        JPY_PIP_SIZE
    } else {
        PIP_SIZE
    }
}

/// Account-currency value of one pip on `lot_size` units of `symbol`, given
/// the rate converting the symbol's quote currency into the account currency.
pub fn pip_value(symbol: Symbol, lot_size: f64, quote_to_account: f64) -> f64 {
    pip_size(symbol) * lot_size * quote_to_account
}

/// Convert a price distance into pips.
pub fn to_pips(symbol: Symbol, distance: f64) -> f64 {
    distance / pip_size(symbol)
}

impl SymbolGraph {
    /// Pip value of `symbol` in `account` currency at the frame's closes.
    pub fn pip_value(
        &self,
        symbol: Symbol,
        account: Currency,
        lot_size: f64,
        frame: &Frame,
    ) -> CoreResult<f64> {
        if !lot_size.is_finite() || lot_size <= 0.0 {
            return Err(CoreError::validation(format!(
                "lot size must be positive, got {lot_size}"
            )));
        }
        let rate = self.conversion_rate(symbol.quote(), account, frame)?;
        Ok(pip_value(symbol, lot_size, rate))
    }
}
