//! Predictors: strategies that turn bars into orders.
//!
//! A predictor is driven through three lifecycle hooks by the period
//! simulator. Its output is untrusted: every order list passes through
//! [`sanitize_orders`](crate::engine::sanitize_orders) before the ledger sees it.
//!
//! Concrete predictors are selected by name through [`create_predictor`].

pub mod bollinger;
pub mod do_nothing;
pub mod factory;
pub mod fixed_target;
pub mod random;
pub mod random_walk;

pub use bollinger::Bollinger;
pub use do_nothing::DoNothing;
pub use factory::{create_predictor, is_known_predictor, FactoryError, PredictorConfig, PREDICTOR_TYPES};
pub use fixed_target::FixedTarget;
pub use random::RandomDirection;
pub use random_walk::RandomWalk;

use crate::domain::{Bar, PeriodId, Order};
use crate::lock::ResourceLock;
use rand::rngs::StdRng;

/// Per-period resources handed to a predictor at construction.
///
/// Each period gets its own generator, seeded from the run seed, so a
/// predictor never shares randomness with another period.
#[derive(Debug, Clone)]
pub struct PredictorContext {
    pub period_id: PeriodId,
    pub rng: StdRng,
    pub lock: ResourceLock,
}

/// Trait for predictors.
///
/// `on_bar` receives one bar per tradable symbol for the minute just closed.
/// Returning `None` means "no intents"; both `None` and an empty list are
/// back-filled with neutral orders.
pub trait Predictor: Send {
    /// Registry name (e.g., "bollinger").
    fn name(&self) -> &str;

    /// Called once with the period's opening bars.
    fn on_period_start(&mut self, _bars: &[Bar]) {}

    fn on_bar(&mut self, bars: &[Bar]) -> Option<Vec<Order>>;

    /// Called once after the period's account is finalized.
    fn on_period_end(&mut self) {}
}
