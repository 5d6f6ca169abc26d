//! Simulation engine: order sanitization, the position ledger, and the
//! per-period minute loop.
//!
//! Each minute of a period runs in four parts:
//!
//! 1. Pending triggers and expiries
//! 2. Exits for open positions (stop-loss before take-profit)
//! 3. Mark-to-market and one equity curve point
//! 4. Predictor orders: sanitize, then place (simulate) or evaluate over a
//!    fixed horizon (benchmark)

pub mod benchmark;
pub mod fills;
pub mod ledger;
pub mod sanitize;
pub mod simulator;

pub use fills::{entry_fill, exit_fill, satisfied_at};
pub use ledger::PositionLedger;
pub use sanitize::sanitize_orders;
pub use simulator::{PeriodSimulator, RunMode, SimConfig, SimulationError, Stage};
