use super::Predictor;
use crate::domain::{Bar, Order};

/// Never trades. Every minute is back-filled with neutral orders.
#[derive(Debug, Clone, Copy, Default)]
pub struct DoNothing;

impl Predictor for DoNothing {
    fn name(&self) -> &str {
        "do_nothing"
    }

    fn on_bar(&mut self, _bars: &[Bar]) -> Option<Vec<Order>> {
        None
    }
}
