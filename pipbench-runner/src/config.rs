//! Serializable run configuration.
//!
//! A run is described by one TOML document:
//!
//! ```toml
//! [run]
//! seed = 7
//! period_count = 4
//! worker_count = 2
//! mode = "simulate"
//!
//! [account]
//! currency = "USD"
//!
//! [data]
//! path = "minutes.csv"
//! symbols = ["EURUSD", "EURJPY"]
//!
//! [predictor]
//! type = "bollinger"
//! params = { window = 120, multiplier = 2.0 }
//!
//! [[assessors]]
//! type = "account_history"
//! options = "--show-periods"
//! ```
//!
//! Everything is checked by [`RunConfig::validate`] before the core sees it.

use pipbench_core::domain::{Currency, PeriodId, Symbol};
use pipbench_core::engine::{RunMode, SimConfig};
use pipbench_core::lock::ResourceLock;
use pipbench_core::predictors::{create_predictor, FactoryError, PredictorConfig, PredictorContext};
use pipbench_core::rng::RngHierarchy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::assessors::{create_assessor, AssessorConfig, AssessorError};

/// Errors from loading or validating a run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid [{section}] {field}: {reason}")]
    Invalid {
        section: &'static str,
        field: &'static str,
        reason: String,
    },
    #[error("predictor: {0}")]
    Predictor(#[from] FactoryError),
    #[error(transparent)]
    Assessor(#[from] AssessorError),
}

fn invalid(section: &'static str, field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        section,
        field,
        reason: reason.into(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub run: RunSection,
    #[serde(default)]
    pub account: AccountSection,
    pub data: DataSection,
    pub predictor: PredictorConfig,
    #[serde(default)]
    pub assessors: Vec<AssessorConfig>,
}

/// Period layout, parallelism and evaluation mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunSection {
    /// Run seed; every period's generator is derived from it.
    #[serde(default)]
    pub seed: u64,
    pub period_count: usize,
    /// Frames per period. Defaults to an equal split of the data.
    #[serde(default)]
    pub period_minutes: Option<usize>,
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    #[serde(default)]
    pub mode: RunMode,
    #[serde(default)]
    pub hold_minutes: Option<usize>,
}

fn default_worker_count() -> usize {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountSection {
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_lot_size")]
    pub lot_size: f64,
    #[serde(default)]
    pub initial_balance: f64,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_lot_size() -> f64 {
    100_000.0
}

impl Default for AccountSection {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            lot_size: default_lot_size(),
            initial_balance: 0.0,
        }
    }
}

/// Market data source plus the requested tradable subset.
///
/// Exactly one of `path` and `synthetic` must be set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataSection {
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub synthetic: Option<SyntheticSection>,
    /// Symbols the predictor may trade.
    pub symbols: Vec<String>,
}

/// Seeded random-walk data, for demos and tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyntheticSection {
    /// Symbols to generate (the available universe).
    pub symbols: Vec<String>,
    pub minutes: usize,
    /// Defaults to the run seed.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl RunConfig {
    /// Read, parse and validate a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let run = &self.run;
        if run.period_count == 0 {
            return Err(invalid("run", "period_count", "must be at least 1"));
        }
        if run.period_minutes == Some(0) {
            return Err(invalid("run", "period_minutes", "must be at least 1"));
        }
        if run.worker_count == 0 {
            return Err(invalid("run", "worker_count", "must be at least 1"));
        }
        match (run.mode, run.hold_minutes) {
            (_, Some(0)) => return Err(invalid("run", "hold_minutes", "must be at least 1")),
            (RunMode::Benchmark, None) => {
                return Err(invalid("run", "hold_minutes", "required in benchmark mode"))
            }
            _ => {}
        }

        self.account_currency()?;
        if !self.account.lot_size.is_finite() || self.account.lot_size <= 0.0 {
            return Err(invalid("account", "lot_size", "must be a positive number"));
        }
        if !self.account.initial_balance.is_finite() {
            return Err(invalid("account", "initial_balance", "must be finite"));
        }

        self.requested_symbols()?;
        match (&self.data.path, &self.data.synthetic) {
            (Some(_), Some(_)) => {
                return Err(invalid("data", "path", "cannot be combined with synthetic"))
            }
            (None, None) => return Err(invalid("data", "path", "either path or synthetic is required")),
            (None, Some(synthetic)) => {
                parse_symbols("data", "synthetic.symbols", &synthetic.symbols)?;
                if synthetic.minutes == 0 {
                    return Err(invalid("data", "synthetic.minutes", "must be at least 1"));
                }
            }
            (Some(_), None) => {}
        }

        // Building a throwaway instance checks the type and every parameter.
        let ctx = PredictorContext {
            period_id: PeriodId(0),
            rng: RngHierarchy::new(run.seed).predictor_rng(PeriodId(0)),
            lock: ResourceLock::new(),
        };
        create_predictor(&self.predictor, ctx)?;

        for assessor in &self.assessors {
            create_assessor(assessor)?;
        }
        Ok(())
    }

    pub fn account_currency(&self) -> Result<Currency, ConfigError> {
        Currency::new(&self.account.currency)
            .map_err(|e| invalid("account", "currency", e.to_string()))
    }

    /// The `[data] symbols` list, parsed and de-duplicated in order.
    pub fn requested_symbols(&self) -> Result<Vec<Symbol>, ConfigError> {
        parse_symbols("data", "symbols", &self.data.symbols)
    }

    /// Typed simulator settings.
    pub fn sim_config(&self) -> Result<SimConfig, ConfigError> {
        Ok(SimConfig {
            mode: self.run.mode,
            hold_minutes: self.run.hold_minutes,
            account_currency: self.account_currency()?,
            lot_size: self.account.lot_size,
            initial_balance: self.account.initial_balance,
        })
    }
}

fn parse_symbols(
    section: &'static str,
    field: &'static str,
    ids: &[String],
) -> Result<Vec<Symbol>, ConfigError> {
    if ids.is_empty() {
        return Err(invalid(section, field, "must list at least one symbol"));
    }
    let mut out: Vec<Symbol> = Vec::with_capacity(ids.len());
    for id in ids {
        let symbol = Symbol::new(id).map_err(|e| invalid(section, field, e.to_string()))?;
        if !out.contains(&symbol) {
            out.push(symbol);
        }
    }
    Ok(out)
}
