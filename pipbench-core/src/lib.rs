//! pipbench core: domain types, symbol graph, position ledger, period simulator.
//!
//! This crate contains the simulation core:
//! - Domain types (symbols, bars, orders, positions, the per-period account)
//! - Symbol graph: required-symbol resolution, currency conversion, pip values
//! - Order sanitization and the position state machine
//! - Period simulator and fixed-horizon benchmarking
//! - Predictor trait, registry and bundled predictors
//! - Deterministic per-period RNG and the shared resource lock

pub mod domain;
pub mod engine;
pub mod error;
pub mod lock;
pub mod predictors;
pub mod rng;
pub mod symbols;

pub use error::{CoreError, CoreResult};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything a worker thread touches is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::Frame>();
        require_sync::<domain::Frame>();
        require_send::<domain::Order>();
        require_sync::<domain::Order>();
        require_send::<domain::Position>();
        require_sync::<domain::Position>();
        require_send::<domain::Account>();
        require_sync::<domain::Account>();

        // Engine types
        require_send::<symbols::SymbolGraph>();
        require_sync::<symbols::SymbolGraph>();
        require_send::<engine::PositionLedger>();
        require_sync::<engine::PositionLedger>();
        require_send::<engine::PeriodSimulator>();
        require_sync::<engine::PeriodSimulator>();
        require_send::<engine::SimulationError>();
        require_sync::<engine::SimulationError>();

        // Shared per-run resources
        require_send::<rng::RngHierarchy>();
        require_sync::<rng::RngHierarchy>();
        require_send::<lock::ResourceLock>();
        require_sync::<lock::ResourceLock>();
        require_send::<predictors::PredictorConfig>();
        require_sync::<predictors::PredictorConfig>();
        require_send::<Box<dyn predictors::Predictor>>();
    }

    /// Predictors never see the account: the hooks take bars only.
    #[test]
    fn predictor_trait_has_no_account_parameter() {
        fn _check_trait_object_builds(
            p: &mut dyn predictors::Predictor,
            bars: &[domain::Bar],
        ) -> Option<Vec<domain::Order>> {
            p.on_period_start(bars);
            let orders = p.on_bar(bars);
            p.on_period_end();
            orders
        }
    }
}
