//! Implements the base structures for a Darcy flow simulation

mod components;
mod config;
mod constants;
mod enums;
mod face;
mod immobile;
mod parameters;
mod sample_params;
mod saturation;
pub use crate::base::components::*;
pub use crate::base::config::*;
pub use crate::base::constants::*;
pub use crate::base::enums::*;
pub use crate::base::face::*;
pub use crate::base::immobile::*;
pub use crate::base::parameters::*;
pub use crate::base::sample_params::*;
pub use crate::base::saturation::*;
