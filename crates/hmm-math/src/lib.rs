//! HMM filter math utilities.

pub mod math;

pub use math::distribution::Distribution;
pub use math::error::{Axis, ProbabilityError, Result};
pub use math::stable::*;
pub use math::table::ConditionalTable;
