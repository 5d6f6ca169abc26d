//! Assessors: consumers of finished period accounts.
//!
//! An assessor is handed every [`PeriodHandle`] of a run and fetches the
//! accounts itself. Handles may be visited in any order; assessors key their
//! aggregates by period id, never by arrival.

pub mod account_history;
pub mod speculative_accuracy;
pub mod status_summary;

pub use account_history::AccountHistory;
pub use speculative_accuracy::SpeculativeAccuracy;
pub use status_summary::StatusSummary;

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::scheduler::{PeriodFailure, PeriodHandle};

/// Registry keys.
pub const ASSESSOR_TYPES: [&str; 3] = ["account_history", "speculative_accuracy", "status_summary"];

/// One `[[assessors]]` entry: registry key plus a command-line style option string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssessorConfig {
    #[serde(rename = "type")]
    pub assessor_type: String,
    #[serde(default)]
    pub options: String,
}

impl AssessorConfig {
    pub fn new(assessor_type: impl Into<String>, options: impl Into<String>) -> Self {
        Self {
            assessor_type: assessor_type.into(),
            options: options.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssessorError {
    #[error("unknown assessor type: {0}")]
    Unknown(String),
    #[error("assessor {assessor}: {message}")]
    Options { assessor: String, message: String },
}

/// Output of one assessor: a human-readable block and a JSON body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessorReport {
    pub assessor: String,
    pub lines: Vec<String>,
    pub body: serde_json::Value,
}

impl fmt::Display for AssessorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== {} ==", self.assessor)?;
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

pub trait Assessor: Send {
    fn name(&self) -> &str;

    /// Wait on the handles it needs and summarize their accounts.
    fn analyse(&mut self, handles: &[PeriodHandle]) -> Result<AssessorReport, PeriodFailure>;
}

/// Parse an option string with clap, the assessor name standing in for argv[0].
pub(crate) fn parse_options<T: Parser>(assessor: &str, options: &str) -> Result<T, AssessorError> {
    let argv = std::iter::once(assessor).chain(options.split_whitespace());
    T::try_parse_from(argv).map_err(|e| AssessorError::Options {
        assessor: assessor.to_string(),
        message: e.to_string().lines().next().unwrap_or_default().to_string(),
    })
}

pub fn create_assessor(config: &AssessorConfig) -> Result<Box<dyn Assessor>, AssessorError> {
    let name = config.assessor_type.as_str();
    match name {
        "account_history" => Ok(Box::new(AccountHistory::from_options(&config.options)?)),
        "speculative_accuracy" => Ok(Box::new(SpeculativeAccuracy::from_options(&config.options)?)),
        "status_summary" => Ok(Box::new(StatusSummary::from_options(&config.options)?)),
        other => Err(AssessorError::Unknown(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_registered_type_builds() {
        for name in ASSESSOR_TYPES {
            let assessor = create_assessor(&AssessorConfig::new(name, "")).unwrap();
            assert_eq!(assessor.name(), name);
        }
    }

    #[test]
    fn unknown_type_is_rejected() {
        let err = create_assessor(&AssessorConfig::new("sharpe", "")).err().unwrap();
        assert_eq!(err, AssessorError::Unknown("sharpe".into()));
    }

    #[test]
    fn bad_options_name_the_assessor() {
        let err = create_assessor(&AssessorConfig::new("status_summary", "--verbose"))
            .err()
            .unwrap();
        assert!(err.to_string().starts_with("assessor status_summary:"));
    }
}
