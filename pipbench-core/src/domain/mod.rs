//! Domain types: symbols, bars, orders, positions, and the per-period account.

pub mod account;
pub mod bar;
pub mod ids;
pub mod order;
pub mod position;
pub mod symbol;

pub use account::{Account, Location};
pub use bar::{validate_frames, Bar, Frame};
pub use ids::{IdGen, PeriodId, PositionId};
pub use order::{Direction, Leg, Order};
pub use position::{Position, Status};
pub use symbol::{Currency, Symbol};
