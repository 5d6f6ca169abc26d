//! pipbench runner: configuration, data loading, period scheduling, assessors.
//!
//! This crate builds on `pipbench-core` to provide:
//! - Typed TOML run configuration with up-front validation
//! - Market data loading from CSV or a seeded synthetic walk
//! - Period planning over the aligned data set
//! - A fixed-size scheduler returning one lazily fetched handle per period
//! - Assessors that aggregate finished accounts by period id

pub mod assessors;
pub mod config;
pub mod data_loader;
pub mod periods;
pub mod run;
pub mod scheduler;

pub use assessors::{
    create_assessor, Assessor, AssessorConfig, AssessorError, AssessorReport, ASSESSOR_TYPES,
};
pub use config::{ConfigError, RunConfig};
pub use data_loader::{load_csv, read_csv, synthetic, write_csv, LoadError, MarketData};
pub use periods::{plan_periods, PeriodPlan};
pub use run::{data_symbols, run_from_config, run_with_data, tradable_symbols, RunError, RunOutcome};
pub use scheduler::{PeriodFailure, PeriodHandle, PeriodScheduler, SchedulerError};
