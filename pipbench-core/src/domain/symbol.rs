//! Currency codes and currency-pair symbols.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A three-letter ISO-style currency code (e.g. `USD`, `JPY`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency([u8; 3]);

impl Currency {
    pub const JPY: Currency = Currency(*b"JPY");
    pub const USD: Currency = Currency(*b"USD");

    pub fn new(code: &str) -> CoreResult<Self> {
        let bytes = code.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii_uppercase) {
            return Err(CoreError::validation(format!(
                "'{code}' is not a three-letter upper-case currency code"
            )));
        }
        Ok(Self([bytes[0], bytes[1], bytes[2]]))
    }

    pub fn as_str(&self) -> &str {
        // Only ASCII upper-case bytes are ever stored.
        std::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Currency {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Currency {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.as_str().to_string()
    }
}

/// A currency pair, quoted as base/quote: `EURUSD` prices one EUR in USD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol {
    base: Currency,
    quote: Currency,
}

impl Symbol {
    /// Parse a six-letter symbol id such as `EURUSD`.
    pub fn new(id: &str) -> CoreResult<Self> {
        if id.len() != 6 || !id.is_ascii() {
            return Err(CoreError::validation(format!(
                "'{id}' is not a six-letter symbol identifier"
            )));
        }
        let base = Currency::new(&id[..3])?;
        let quote = Currency::new(&id[3..])?;
        Self::from_legs(base, quote)
    }

    pub fn from_legs(base: Currency, quote: Currency) -> CoreResult<Self> {
        if base == quote {
            return Err(CoreError::validation(format!(
                "symbol {base}{quote} has identical legs"
            )));
        }
        Ok(Self { base, quote })
    }

    /// Parse a list of symbol ids, failing on the first malformed entry.
    pub fn parse_list<S: AsRef<str>>(ids: &[S]) -> CoreResult<Vec<Self>> {
        ids.iter().map(|s| Self::new(s.as_ref())).collect()
    }

    pub fn base(&self) -> Currency {
        self.base
    }

    pub fn quote(&self) -> Currency {
        self.quote
    }

    /// Yen-quoted pairs are priced to two decimals rather than four.
    pub fn is_jpy_quoted(&self) -> bool {
        self.quote == Currency::JPY
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.base, self.quote)
    }
}

impl FromStr for Symbol {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Symbol {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_legs() {
        let s = Symbol::new("EURUSD").unwrap();
        assert_eq!(s.base().as_str(), "EUR");
        assert_eq!(s.quote(), Currency::USD);
        assert_eq!(s.to_string(), "EURUSD");
    }

    #[test]
    fn rejects_malformed_ids() {
        for bad in ["", "EURUS", "EURUSDX", "eurusd", "EUR-SD", "USDUSD", "ÉURUSD"] {
            let err = Symbol::new(bad).unwrap_err();
            assert!(err.is_validation(), "{bad} should be rejected");
        }
    }

    #[test]
    fn detects_jpy_quote() {
        assert!(Symbol::new("USDJPY").unwrap().is_jpy_quoted());
        assert!(!Symbol::new("JPYUSD").unwrap().is_jpy_quoted());
    }

    #[test]
    fn serializes_as_plain_string() {
        let s = Symbol::new("AUDNZD").unwrap();
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, "\"AUDNZD\"");
        let back: Symbol = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
        assert!(serde_json::from_str::<Symbol>("\"AUD\"").is_err());
    }

    #[test]
    fn parse_list_stops_at_first_bad_entry() {
        assert_eq!(Symbol::parse_list(&["EURUSD", "USDJPY"]).unwrap().len(), 2);
        assert!(Symbol::parse_list(&["EURUSD", "nope"]).is_err());
    }
}
