//! Implements the temporal interpolation of element properties within a time-step

mod calculators;
mod multi_property;
mod temporal_property;
pub use crate::interp::calculators::*;
pub use crate::interp::multi_property::*;
pub use crate::interp::temporal_property::*;
